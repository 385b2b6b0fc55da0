//! The seam between the replay driver and the opaque execution engine.
//!
//! Block production itself is out of scope for the replay core: the engine
//! behind [ExecutionBackend] owns the state trie and the rollup state
//! machine. The driver only ever observes it through produced headers.

use crate::header::HeaderReader;
use alloc::{sync::Arc, vec::Vec};
use alloy_consensus::Header;
use alloy_primitives::B256;
use vela_derive::{InitMessage, MessageWithMetadata};
use vela_genesis::ChainConfig;
use vela_preimage::{PreimageOracleResult, ReplayTape};

/// How the execution state is opened.
///
/// Replay always opens state in [StateMode::Deterministic], which disables
/// any caching whose observable behavior depends on iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMode {
    /// Regular operation; caches may behave adaptively.
    Normal,
    /// Bit-for-bit reproducible operation.
    Deterministic,
}

/// The rollup system state the driver reads before producing a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    /// The chain id recorded in state.
    pub chain_id: u64,
    /// The genesis block number recorded in state.
    pub genesis_block_num: u64,
    /// The serialized chain config, empty when state predates configs.
    pub chain_config_json: Vec<u8>,
}

/// The opaque block-production engine.
///
/// Synchronous by design: implementations that need oracle data resolve it
/// internally through [crate::block_on], keeping the replay single-
/// threaded end to end.
pub trait ExecutionBackend {
    /// The engine's error type.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Opens the execution state at `state_root`.
    fn open_state(&mut self, state_root: B256, mode: StateMode) -> Result<(), Self::Error>;

    /// Reads the rollup system state out of the opened state.
    fn system_state(&mut self) -> Result<SystemState, Self::Error>;

    /// Executes `message` on top of `prior` and returns the produced
    /// header.
    ///
    /// Ancestor lookups go through `context`, which rejects a witness
    /// header whose decoded number disagrees with the requested one;
    /// `fetcher` serves the inbox slots batch posting reports price.
    fn produce_block(
        &mut self,
        prior: &Header,
        message: &MessageWithMetadata,
        config: &ChainConfig,
        context: &dyn HeaderReader,
        fetcher: &dyn BatchFetcher,
    ) -> Result<Header, Self::Error>;

    /// Initializes the rollup state machine from an init message and
    /// returns the genesis header.
    fn initialize_genesis(
        &mut self,
        init: &InitMessage,
        config: &ChainConfig,
    ) -> Result<Header, Self::Error>;
}

/// Batch-by-number lookups handed to the execution seam so batch posting
/// reports can price the batches they reference. Object-safe for the same
/// reason [HeaderReader] is.
pub trait BatchFetcher {
    /// Reads the inbox slot at `batch_num`.
    fn fetch(&self, batch_num: u64) -> PreimageOracleResult<Vec<u8>>;
}

/// The tape-backed [BatchFetcher] the replay driver constructs.
#[derive(Debug, Clone)]
pub struct TapeBatchFetcher<T> {
    tape: Arc<T>,
}

impl<T: ReplayTape + Send + Sync> TapeBatchFetcher<T> {
    /// Creates a new [TapeBatchFetcher] over the given tape.
    pub const fn new(tape: Arc<T>) -> Self {
        Self { tape }
    }
}

impl<T: ReplayTape + Send + Sync> BatchFetcher for TapeBatchFetcher<T> {
    /// Reads the inbox slot at `batch_num`, blocking on the tape.
    fn fetch(&self, batch_num: u64) -> PreimageOracleResult<Vec<u8>> {
        crate::block_on(self.tape.read_inbox_message(batch_num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_preimage::test_utils::TestOracle;

    #[test]
    fn test_batch_fetcher_reads_through_the_tape() {
        let oracle = Arc::new(TestOracle::new());
        oracle.push_sequencer_message(b"batch zero".to_vec());

        let fetcher = TapeBatchFetcher::new(oracle);
        // Through the trait object, the way the execution seam sees it.
        let fetcher: &dyn BatchFetcher = &fetcher;
        assert_eq!(fetcher.fetch(0).unwrap(), b"batch zero");
        assert!(fetcher.fetch(1).is_err());
    }
}
