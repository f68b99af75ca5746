mod music;
mod utils;

pub use music::*;
pub use utils::*;
