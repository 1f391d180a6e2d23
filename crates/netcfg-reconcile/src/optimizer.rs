//! Rule set optimization hook.
//!
//! Runs on the desired rules before filters and owners are projected out of
//! them. The default leaves the rules unchanged.

use std::collections::HashSet;

use netcfg_core::Rule;

/// Rewrites a desired rule set into an equivalent one.
pub trait Optimizer {
    fn optimize(&self, rules: HashSet<Rule>) -> HashSet<Rule>;
}

/// Returns the rules unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Optimizer for PassThrough {
    fn optimize(&self, rules: HashSet<Rule>) -> HashSet<Rule> {
        rules
    }
}

impl<F> Optimizer for F
where
    F: Fn(HashSet<Rule>) -> HashSet<Rule>,
{
    fn optimize(&self, rules: HashSet<Rule>) -> HashSet<Rule> {
        self(rules)
    }
}
