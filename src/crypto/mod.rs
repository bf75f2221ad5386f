pub mod codec;
pub mod generator;
pub mod hasher;

pub use codec::{CodecError, MasterKey, SecretCodec};
pub use hasher::CredentialHasher;
