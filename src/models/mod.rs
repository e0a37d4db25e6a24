pub mod block;
pub mod entry;
pub mod hook;
pub mod limit;
pub mod quota;

pub use block::{FamilyStats, FamilyTallies, ModelFamily, SessionBlock, TokenCounts};
pub use entry::UsageEvent;
pub use hook::HookJson;
pub use limit::{LimitKind, LimitSignal};
pub use quota::{ActiveBlockInfo, DynamicLimits, QuotaAmount, QuotaEntry, QuotaReport};
