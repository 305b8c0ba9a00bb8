use core::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use derive_more::Display;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Registry};

pub use tracing;

/// Slot of the most recently committed state, shown in every log line written through the
/// `*_with_slot` macros.
pub static SLOT_LOG_CONTEXT: SlotLogContext = SlotLogContext::new();

const LOG_FILTER_ENV_VAR: &str = "BEACON_LOG";

const WORKSPACE_CRATES: &[&str] = &[
    "blob_store",
    "block_processor",
    "consensus_driver",
    "database",
    "dispatcher",
    "eth1",
    "execution_engine",
    "transition_functions",
];

#[derive(Display, Debug)]
#[display("slot: {slot:?}")]
pub struct SlotLogContext {
    slot: AtomicU64,
}

impl SlotLogContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: AtomicU64::new(0),
        }
    }

    pub fn set_slot(&self, slot: u64) {
        self.slot.store(slot, Ordering::Relaxed)
    }

    #[must_use]
    pub fn slot(&self) -> u64 {
        self.slot.load(Ordering::Relaxed)
    }
}

impl Default for SlotLogContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a global `tracing` subscriber writing compact lines to standard output.
///
/// Workspace crates and `module_path` log at `info` by default. Directives in `directives`
/// (usually from the command line) and then in the `BEACON_LOG` environment variable override
/// the defaults. Records emitted through the `log` crate are forwarded to the subscriber.
pub fn initialize_logger(module_path: &str, directives: Option<&str>) -> Result<()> {
    let mut filter = EnvFilter::default().add_directive(LevelFilter::OFF.into());

    for crate_name in WORKSPACE_CRATES.iter().copied().chain([module_path]) {
        filter = filter.add_directive(format!("{crate_name}=info").parse()?);
    }

    for directive in directives
        .into_iter()
        .flat_map(|directives| directives.split(','))
        .filter(|directive| !directive.is_empty())
    {
        filter = filter.add_directive(directive.parse()?);
    }

    if let Ok(env_filter) = EnvFilter::try_from_env(LOG_FILTER_ENV_VAR) {
        for directive in env_filter.to_string().split(',') {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    let stdout_layer = fmt::layer::<Registry>()
        .compact()
        .with_thread_ids(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .try_init()
        .map_err(|error| anyhow!(error))
}

#[macro_export]
macro_rules! info_with_slot {
    ($($arg:tt)*) => {
        $crate::tracing::info!("[{}] {}", $crate::SLOT_LOG_CONTEXT, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! debug_with_slot {
    ($($arg:tt)*) => {
        $crate::tracing::debug!("[{}] {}", $crate::SLOT_LOG_CONTEXT, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_with_slot {
    ($($arg:tt)*) => {
        $crate::tracing::warn!("[{}] {}", $crate::SLOT_LOG_CONTEXT, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_with_slot {
    ($($arg:tt)*) => {
        $crate::tracing::error!("[{}] {}", $crate::SLOT_LOG_CONTEXT, format_args!($($arg)*));
    };
}
