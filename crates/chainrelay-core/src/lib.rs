//! # chainrelay-core
//!
//! Chain primitives and the decode path shared across the ChainRelay
//! crates: compact names, assets, the little-endian wire codec, ABI
//! definitions, the LRU ABI cache, and the deadline-bounded transaction
//! decoder.

pub mod abi;
pub mod asset;
pub mod cache;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod name;
pub mod types;

pub use abi::{AbiActionDef, AbiDef, AbiFieldDef, AbiStructDef, AbiTypeDef};
pub use asset::{Asset, Symbol};
pub use cache::AbiCache;
pub use codec::{ByteReader, ByteWriter};
pub use decoder::{AbiDecoder, AbiResolver, MapResolver};
pub use error::{AbiError, CodecError, DecodeError, NameError, SymbolError};
pub use name::{AccountName, ActionName, Name, PermissionName};
pub use types::{
    Action, PackedTransaction, PermissionLevel, ReceiptStatus, ReceiptTransaction, SignedBlock,
    TimePointSec, Transaction, TransactionId, TransactionMetadata, TransactionReceipt,
    TransactionTrace,
};
