pub mod add;
pub mod cat;
pub mod config;
pub mod id;
pub mod version;

pub use add::Add;
pub use cat::Cat;
pub use config::ConfigShow;
pub use id::Id;
pub use version::Version;

crate::command_enum! {
    (Version, Version),
    (Id, Id),
    (Add, Add),
    (Cat, Cat),
    (Config, ConfigShow),
}

impl Command {
    /// Rewrite the command for a daemon that does not share our working
    /// directory. Relative file arguments are made absolute.
    pub fn for_remote(&self) -> std::io::Result<Self> {
        match self {
            Command::Add(add) => Ok(Command::Add(Add {
                file: std::path::absolute(&add.file)?,
            })),
            other => Ok(other.clone()),
        }
    }
}
