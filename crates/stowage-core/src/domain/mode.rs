//! SaveMode - 保存経路への再入を明示する引数
//!
//! job の中でレコードを保存すると、通常の save lifecycle（background dispatch を
//! 含む）にもう一度入ることになる。どちらの経路なのかをインスタンスの状態ではなく
//! 引数として渡すことで、フラグの取り残しや使い回しによる漏れを無くす。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Normal request-path save: asset work may be handed to a background job.
    #[default]
    Deferred,
    /// Background dispatch is already satisfied; do the asset work now.
    Inline,
}

impl SaveMode {
    pub fn skips_background_dispatch(self) -> bool {
        matches!(self, SaveMode::Inline)
    }
}
