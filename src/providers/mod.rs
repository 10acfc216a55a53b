//! # 提供商注册表
//!
//! 内置提供商预设、按配置构建的客户端集合，以及微信错误体辅助函数

mod registry;
mod types;
mod wechat;

pub use registry::{ClientRegistry, RegisteredClient};
pub use types::Provider;
pub use wechat::{WeChatApiError, wechat_api_error};
