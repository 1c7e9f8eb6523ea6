//! 促销码服务 Proto 定义
//!
//! 由 tonic-prost-build 从 proto/promo.proto 生成，
//! 供服务端实现和内部客户端共同引用。

pub mod promo {
    tonic::include_proto!("promo");
}
