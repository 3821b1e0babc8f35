pub mod for_logic;
pub mod if_logic;

pub use for_logic::*;
pub use if_logic::*;
