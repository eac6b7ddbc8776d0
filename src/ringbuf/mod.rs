//! Raw byte ring used as the storage of each channel direction

pub mod circular;

#[cfg(test)]
mod tests;

pub use circular::CircularBuffer;
