// Media I/O core for the Openterface mini-KVM desktop client
//
// The GUI crate builds on four pieces: the dynamic-library load gate
// (loadgate), video sink selection and pipeline plumbing (video), the
// audio loopback worker (audio), and the event surface it renders
// (events).

pub mod audio;
pub mod config;
pub mod events;
pub mod loadgate;
pub mod state;
pub mod video;
