pub mod duplicates;
pub mod grouping;
pub mod merge;
pub mod primary;

pub use duplicates::{find_duplicate_embeddings, DuplicateCluster};
pub use grouping::{group_by_similarity, GroupMember, SimilarityGroup};
pub use merge::{merge_identities, MergeOutcome, RefreshHints};
pub use primary::select_primary;
