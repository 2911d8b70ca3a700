use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::ops::{Add, Deref, DerefMut, Sub};
use std::str::FromStr;

pub use web3::{
    self,
    types::{Address, Bytes, H160, H256, U256, U64},
};

#[macro_use]
mod macros;

basic_type!(
    /// L1 batch (a group of miniblocks committed to L1 together).
    L1BatchNumber,
    u32
);

basic_type!(
    /// L2 block, a.k.a. miniblock.
    MiniblockNumber,
    u32
);
