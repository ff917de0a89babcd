pub mod boxing;
pub mod layout;
pub mod placement;
