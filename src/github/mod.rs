// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Group the remote activity source: trait seam, HTTP and fixture backends, repo ids, error taxonomy
// role: module/aggregation
// outputs: GithubApi, Page, PullState, Token, RepoId, ApiError, build_api
// invariants: Callers outside this module only see the trait; backends are chosen by build_api
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod api;
pub mod error;
pub mod fixture;
pub mod http;
pub mod repo;

pub use api::{build_api, get_github_token, GithubApi, Page, PullState, Token};
pub use error::ApiError;
pub use repo::RepoId;
