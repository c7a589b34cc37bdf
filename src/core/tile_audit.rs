use crate::config::MosaicConfig;
use crate::io::naming;
use crate::types::{Polarization, Tile, TileId};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Overall result of an existence audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditVerdict {
    AllTilesExist,
    TilesNotFound,
}

impl std::fmt::Display for AuditVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditVerdict::AllTilesExist => write!(f, "All tiles exist"),
            AuditVerdict::TilesNotFound => write!(f, "Tiles not found"),
        }
    }
}

/// Per-channel existence; `None` marks an inactive tile where nothing is expected
pub type ChannelPresence = BTreeMap<Polarization, Option<bool>>;

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Serialized keyed by tile name (`h{h}v{v}`), since JSON keys must be strings
    #[serde(serialize_with = "records_by_tile_name")]
    pub records: BTreeMap<TileId, ChannelPresence>,
    pub verdict: AuditVerdict,
}

impl AuditReport {
    /// Active (tile, channel) pairs whose raster is absent
    pub fn missing(&self) -> Vec<(TileId, Polarization)> {
        self.records
            .iter()
            .flat_map(|(tile, channels)| {
                channels
                    .iter()
                    .filter(|(_, present)| **present == Some(false))
                    .map(move |(channel, _)| (*tile, *channel))
            })
            .collect()
    }
}

fn records_by_tile_name<S: Serializer>(
    records: &BTreeMap<TileId, ChannelPresence>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(records.iter().map(|(tile, presence)| (tile.to_string(), presence)))
}

/// Checks that every active tile has a final raster for every channel
pub struct TileAuditor {
    out_dir: PathBuf,
    channels: Vec<Polarization>,
}

impl TileAuditor {
    pub fn new(out_dir: PathBuf, channels: Vec<Polarization>) -> Self {
        Self { out_dir, channels }
    }

    pub fn from_config(config: &MosaicConfig) -> Self {
        Self::new(config.output_dir(), config.channels.clone())
    }

    /// Visit every tile, then settle the verdict
    pub fn audit(&self, tiles: &[Tile]) -> AuditReport {
        let mut records = BTreeMap::new();
        let mut all_exist = true;

        for tile in tiles {
            let presence: ChannelPresence = self
                .channels
                .iter()
                .map(|&channel| {
                    let present = tile
                        .active
                        .then(|| naming::tile_raster(&self.out_dir, tile.id, channel).exists());
                    (channel, present)
                })
                .collect();

            if presence.values().any(|p| *p == Some(false)) {
                all_exist = false;
            }
            records.insert(tile.id, presence);
        }

        let verdict = if all_exist {
            AuditVerdict::AllTilesExist
        } else {
            AuditVerdict::TilesNotFound
        };
        log::info!("{}", verdict);

        AuditReport { records, verdict }
    }
}
