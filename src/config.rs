//! Pipeline configuration.
//!
//! Library users build [`PipelineConfig`] directly (every part has a usable
//! `Default`); the binary fills it from [`PipelineArgs`], which reads flags or
//! `ORDERFLOW_*` environment variables.

use crate::domain::envelope::{DEFAULT_ORDERING_GROUP, DedupStrategy, OrderingStrategy};
use clap::{Args, ValueEnum};
use std::time::Duration;

/// Matches the dedup window of the managed FIFO queues this models.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 5;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a `create` does once it reaches the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CreatePolicy {
    /// Unconditional put; the upstream existence check is the only guard.
    #[default]
    Upsert,
    /// Conditional put; a create never overwrites a different record.
    IfAbsent,
}

#[derive(Debug, Clone, Default)]
pub struct IngestionConfig {
    pub ordering: OrderingStrategy,
    pub dedup: DedupStrategy,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub dedup_window: Duration,
    /// 0 disables dead-lettering.
    pub max_receive_count: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dedup_window: DEFAULT_DEDUP_WINDOW,
            max_receive_count: DEFAULT_MAX_RECEIVE_COUNT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub create_policy: CreatePolicy,
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            create_policy: CreatePolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub ingestion: IngestionConfig,
    pub queue: QueueConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderingMode {
    Global,
    PerRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DedupMode {
    /// Fresh random token per request
    PerCall,
    /// Hash of the request content and the record it was checked against
    Content,
}

impl From<DedupMode> for DedupStrategy {
    fn from(mode: DedupMode) -> Self {
        match mode {
            DedupMode::PerCall => Self::PerCall,
            DedupMode::Content => Self::Content,
        }
    }
}

/// Command-line / environment configuration for the pipeline.
#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    /// How mutations are grouped for ordered delivery
    #[arg(long, env = "ORDERFLOW_ORDERING", value_enum, default_value_t = OrderingMode::Global)]
    pub ordering: OrderingMode,

    /// Message group used in global ordering when a request names none
    #[arg(long, env = "ORDERFLOW_GROUP_ID", default_value = DEFAULT_ORDERING_GROUP)]
    pub group_id: String,

    /// How deduplication tokens are produced
    #[arg(long, env = "ORDERFLOW_DEDUP", value_enum, default_value_t = DedupMode::PerCall)]
    pub dedup: DedupMode,

    /// What a create does when the record already exists at apply time
    #[arg(long, env = "ORDERFLOW_CREATE_POLICY", value_enum, default_value_t = CreatePolicy::Upsert)]
    pub create_policy: CreatePolicy,

    /// Seconds during which a repeated dedup token is coalesced
    #[arg(long, env = "ORDERFLOW_DEDUP_WINDOW_SECS", default_value_t = DEFAULT_DEDUP_WINDOW.as_secs())]
    pub dedup_window_secs: u64,

    /// Deliveries before a message is dead-lettered (0 = never)
    #[arg(long, env = "ORDERFLOW_MAX_RECEIVE_COUNT", default_value_t = DEFAULT_MAX_RECEIVE_COUNT)]
    pub max_receive_count: u32,

    /// Maximum deliveries the worker takes per receive
    #[arg(long, env = "ORDERFLOW_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl From<&PipelineArgs> for PipelineConfig {
    fn from(args: &PipelineArgs) -> Self {
        let ordering = match args.ordering {
            OrderingMode::Global => OrderingStrategy::Global {
                default_group: args.group_id.clone(),
            },
            OrderingMode::PerRecord => OrderingStrategy::PerRecord,
        };

        Self {
            ingestion: IngestionConfig {
                ordering,
                dedup: args.dedup.into(),
            },
            queue: QueueConfig {
                dedup_window: Duration::from_secs(args.dedup_window_secs),
                max_receive_count: args.max_receive_count,
            },
            worker: WorkerConfig {
                create_policy: args.create_policy,
                batch_size: args.batch_size.max(1),
                ..WorkerConfig::default()
            },
        }
    }
}
