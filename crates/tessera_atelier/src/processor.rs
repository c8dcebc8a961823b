//! Context processor contract and the chain that runs processors in order.

use tessera_croquis::TemplateContentModel;

use crate::context::ExecutionContext;
use crate::errors::ProcessResult;

/// Runs before every other processor.
pub const HIGHEST_PRIORITY: i32 = i32::MAX;
pub const DEFAULT_PRIORITY: i32 = 0;

/// A unit of work that reads the execution context and writes into the
/// content model.
pub trait ContextProcessor: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Component categories this processor applies to. Empty means all.
    fn any_of(&self) -> &[&'static str] {
        &[]
    }

    /// Higher runs first
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Whether this processor applies to the render described by `ctx`.
    fn accepts(&self, ctx: &ExecutionContext) -> bool {
        let categories = self.any_of();
        categories.is_empty() || categories.iter().any(|c| ctx.has_category(c))
    }

    fn process(&self, ctx: &ExecutionContext, model: &TemplateContentModel) -> ProcessResult<()>;
}

/// Processors ordered by descending priority.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn ContextProcessor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a processor. Equal priorities keep registration order.
    pub fn register<P: ContextProcessor + 'static>(&mut self, processor: P) -> &mut Self {
        self.processors.push(Box::new(processor));
        self.processors
            .sort_by_key(|p| std::cmp::Reverse(p.priority()));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run every accepting processor in order, stopping at the first failure.
    ///
    /// Returns how many processors ran.
    pub fn run(
        &self,
        ctx: &ExecutionContext,
        model: &TemplateContentModel,
    ) -> ProcessResult<usize> {
        let mut ran = 0;
        for processor in self.processors.iter().filter(|p| p.accepts(ctx)) {
            tracing::debug!(
                processor = processor.name(),
                priority = processor.priority(),
                "running context processor"
            );
            processor.process(ctx, model)?;
            ran += 1;
        }
        Ok(ran)
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.processors.iter().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ExtractError, ProcessError};

    struct Mark {
        name: &'static str,
        priority: i32,
        any_of: &'static [&'static str],
    }

    impl ContextProcessor for Mark {
        fn name(&self) -> &'static str {
            self.name
        }

        fn any_of(&self) -> &[&'static str] {
            self.any_of
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn process(
            &self,
            _ctx: &ExecutionContext,
            model: &TemplateContentModel,
        ) -> ProcessResult<()> {
            let order = model.get_as_string("order");
            model.set("order", format!("{order}{}", self.name));
            Ok(())
        }
    }

    struct Broken;

    impl ContextProcessor for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn priority(&self) -> i32 {
            5
        }

        fn process(
            &self,
            _ctx: &ExecutionContext,
            _model: &TemplateContentModel,
        ) -> ProcessResult<()> {
            Err(ProcessError::new(
                self.name(),
                "/sites/home",
                ExtractError::Property {
                    name: "x".into(),
                    reason: "unreadable".into(),
                },
            ))
        }
    }

    fn mark(name: &'static str, priority: i32) -> Mark {
        Mark {
            name,
            priority,
            any_of: &[],
        }
    }

    #[test]
    fn test_runs_by_descending_priority() {
        let mut chain = ProcessorChain::new();
        chain
            .register(mark("c", 1))
            .register(mark("a", HIGHEST_PRIORITY))
            .register(mark("b", 10));

        let model = TemplateContentModel::default();
        let ran = chain.run(&ExecutionContext::new(), &model).unwrap();
        assert_eq!(ran, 3);
        assert_eq!(model.get_as_string("order"), "abc");
    }

    #[test]
    fn test_skips_unmatched_categories() {
        let mut chain = ProcessorChain::new();
        chain.register(mark("a", 2)).register(Mark {
            name: "t",
            priority: 1,
            any_of: &["teaser"],
        });

        let model = TemplateContentModel::default();
        let ctx = ExecutionContext::new().with_categories(["content"]);
        assert_eq!(chain.run(&ctx, &model).unwrap(), 1);
        assert_eq!(model.get_as_string("order"), "a");

        let model = TemplateContentModel::default();
        let ctx = ExecutionContext::new().with_categories(["teaser"]);
        assert_eq!(chain.run(&ctx, &model).unwrap(), 2);
        assert_eq!(model.get_as_string("order"), "at");
    }

    #[test]
    fn test_stops_at_first_failure() {
        let mut chain = ProcessorChain::new();
        chain
            .register(mark("first", 10))
            .register(Broken)
            .register(mark("never", 1));

        let model = TemplateContentModel::default();
        let err = chain.run(&ExecutionContext::new(), &model).unwrap_err();
        assert_eq!(err.processor, "broken");
        assert_eq!(model.get_as_string("order"), "first");
    }
}
