//! Durable recommendation archive port.

use crate::domain::error::StockwatchError;
use crate::domain::recommendation::Archive;

pub trait ArchiveStore {
    /// The whole archive; an archive that was never saved is empty.
    fn load(&self) -> Result<Archive, StockwatchError>;

    /// Replace the stored archive as one unit.
    fn save(&self, archive: &Archive) -> Result<(), StockwatchError>;
}
