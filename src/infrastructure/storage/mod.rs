pub mod output_namer;
pub mod temporary_audio_store;

pub use output_namer::{is_output_name, OutputNamer};
pub use temporary_audio_store::{
    AssetGuard, FsTemporaryAudioStore, StorageError, TemporaryAsset, TemporaryAudioStore,
};
