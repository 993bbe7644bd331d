//! Action selection policies.

pub mod random;
pub mod trait_;

pub use random::RandomPolicy;
pub use trait_::Policy;
