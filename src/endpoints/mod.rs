mod protected;
mod public;

pub use protected::protected;
pub use public::{health, public};
