//! Market odds boosting: the compiled-in strategy registry and the
//! applicator that rewrites matched markets of an odds-change message.

pub mod applicator;
pub mod strategy;

pub use applicator::apply;
pub use strategy::BoostStrategy;
