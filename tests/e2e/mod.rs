// End-to-end integration tests for the Voice Maker HTTP API
//
// Each test starts the real router on an ephemeral port with its own
// temporary directories. The XTTS worker is replaced by a fake model that
// writes a tiny WAV file, so the suite runs without Python or a GPU.
//
// Tests run in parallel by default: nothing is shared between contexts.

mod helpers;
mod test_audio;
mod test_synthesis;
