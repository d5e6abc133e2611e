pub mod assemble;
pub mod instructions;
pub mod placement;
pub mod session;
pub mod submit;
