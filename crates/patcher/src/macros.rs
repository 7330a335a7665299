//! Macros for step boilerplate

/// Implements the metadata half of [`Step`](crate::step::Step) for a struct
/// with a `core: StepCore` field.
macro_rules! step_metadata {
    ($kind:ident, $name:literal, $group:ident) => {
        fn kind(&self) -> $crate::step::StepKind {
            $crate::step::StepKind::$kind
        }

        fn name(&self) -> &'static str {
            $name
        }

        fn group(&self) -> apkm_types::StepGroup {
            apkm_types::StepGroup::$group
        }

        fn core(&self) -> &$crate::step::StepCore {
            &self.core
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    };
}
