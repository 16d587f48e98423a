//! External collaborator clients
//!
//! Each renderer the pipeline leans on gets its own client: abc2midi and
//! fluidsynth as subprocesses, libmp3lame in-process.

pub mod abc2midi_client;
pub mod fluidsynth_client;
pub mod mp3_encoder;

pub use abc2midi_client::Abc2MidiClient;
pub use fluidsynth_client::FluidSynthClient;
