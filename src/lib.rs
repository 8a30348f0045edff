#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use cl_codec as codec;
pub use cl_config as config;
pub use cl_reflect as reflect;
pub use cl_utils as utils;

pub use cl_codec::{ClutchError, Context, ContextBuilder, Entity, RuntimeError};
