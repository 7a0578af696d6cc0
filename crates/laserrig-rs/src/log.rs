use crate::types::NodeId;
use alloc::format;
use alloc::string::String;

/// Log target of the wire trace (every frame or serial buffer sent and received).
pub(crate) const WIRE_TARGET: &str = "laserrig::wire";

/// Trait for structs that provide metadata for logging
pub trait LogMetadata {
    fn meta(&self) -> String;
}

/// Per-node context attached to drive and motion log lines.
pub struct NodeContext {
    pub component: &'static str,
    pub node: NodeId,
}

impl NodeContext {
    pub const fn new(component: &'static str, node: NodeId) -> Self {
        Self { component, node }
    }
}

impl LogMetadata for NodeContext {
    fn meta(&self) -> String {
        format!("component={}, node={}", self.component, self.node)
    }
}

// =============================================
// Logging Macros (namespaced under crate::log)
// =============================================

// ===== node_info! =====
macro_rules! node_info {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::info!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== node_warn! =====
macro_rules! node_warn {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::warn!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== node_error! =====
macro_rules! node_error {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::error!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== node_debug! =====
macro_rules! node_debug {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::debug!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== wire_trace! =====
macro_rules! wire_trace {
    ($fmt:literal $(, $($arg:tt)+)?) => {{
        ::log::trace!(target: $crate::log::WIRE_TARGET, $fmt $(, $($arg)+)?);
    }};
}

// Re-export macros for use in other files
pub(crate) use node_debug;
pub(crate) use node_error;
pub(crate) use node_info;
pub(crate) use node_warn;
pub(crate) use wire_trace;
