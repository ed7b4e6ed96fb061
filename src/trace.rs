//! Tracing hooks for the detection pipeline.
//!
//! `detect` opens a `detect` span per image, iterative mode adds one
//! `refine_round` span per refinement, and the final decode runs under
//! `decode_classes`. Events report the ROI-pooling layer found at load, the
//! image info written to the network, per-class NMS counts and the final
//! detection count.
//!
//! Without the `tracing` feature every macro expands to nothing observable.

/// Opens an info-level span.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Info-level event: load and per-image milestones.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Debug-level event: per refinement round and per class.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Span guard used when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_with_fields() {
        let _span = trace_span!("detect", width = 4usize, height = 3usize).entered();
        trace_event!("detections", count = 0usize);
        trace_debug!("class_nms", class = 1usize, kept = 0usize);
    }
}
