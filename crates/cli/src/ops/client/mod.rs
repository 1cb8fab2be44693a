pub mod init;
pub mod migrate;

pub use init::Init;
pub use migrate::Migrate;

crate::command_enum! {
    (Init, Init),
    (Migrate, Migrate),
}
