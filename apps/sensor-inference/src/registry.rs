//! Fixed, ordered set of monitored sensors.
//!
//! Registry order is the column order the scaler and the anomaly model were
//! fitted on, so it must be reproduced exactly when building the current
//! reading vector.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Reference deployment: pump + motor instrumentation, in fitted column order.
pub const DEFAULT_SENSORS: [&str; 19] = [
    "Temp_Estator_Fase_U",
    "Temp_Estator_Fase_V",
    "Temp_Estator_Fase_WA",
    "Temp_Estator_Fase_WB",
    "Vibração_Bomba_LA",
    "Vazão_Bomba",
    "Corrente",
    "Pressão_Desc",
    "Pressão_Suc",
    "Posição_FCV",
    "Temp_externo_mancal_escora_LNA",
    "Temp_interno_mancal_escora_LNA",
    "Pressão_Selo_LA",
    "Pressão_Selo_LNA",
    "Temp_mancal_LA_bomba",
    "Temp_mancal_LA_motor",
    "Temp_mancal_LNA_bomba",
    "Temp_mancal_LNA_motor",
    "Temp_Oleo_ULF",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SensorId(String);

impl SensorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SensorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps an external column name onto canonical form: trim, spaces become
/// `_`, periods are removed. Pure and idempotent on canonical input.
pub fn canonical_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SensorRegistry {
    sensors: Vec<SensorId>,
    index: HashMap<String, usize>,
}

impl SensorRegistry {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sensors = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let canonical = canonical_name(name.as_ref());
            if canonical.is_empty() {
                bail!("sensor registry contains an empty name");
            }
            if index.contains_key(&canonical) {
                bail!("sensor registry lists {canonical} more than once");
            }
            index.insert(canonical.clone(), sensors.len());
            sensors.push(SensorId(canonical));
        }
        if sensors.is_empty() {
            bail!("sensor registry is empty");
        }
        Ok(Self { sensors, index })
    }

    pub fn reference() -> Self {
        let sensors: Vec<SensorId> = DEFAULT_SENSORS
            .iter()
            .map(|name| SensorId((*name).to_string()))
            .collect();
        let index = sensors
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.0.clone(), idx))
            .collect();
        Self { sensors, index }
    }

    /// Reads a JSON array of sensor names.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sensor registry {}", path.display()))?;
        let names: Vec<String> = serde_json::from_str(&contents)
            .with_context(|| format!("invalid sensor registry {}", path.display()))?;
        Self::new(names)
    }

    pub fn sensors(&self) -> &[SensorId] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn canonicalize(&self, raw: &str) -> Option<SensorId> {
        let canonical = canonical_name(raw);
        self.position(&canonical)
            .map(|idx| self.sensors[idx].clone())
    }

    /// Re-keys raw per-column series by registry position, silently
    /// dropping unknown columns. Later raw names (in key order) win when two
    /// of them canonicalize to the same sensor.
    pub fn canonicalize_histories<'a>(
        &self,
        raw: &'a BTreeMap<String, Vec<f64>>,
    ) -> Vec<Option<&'a [f64]>> {
        let mut out: Vec<Option<&'a [f64]>> = vec![None; self.sensors.len()];
        for (name, values) in raw {
            let canonical = canonical_name(name);
            match self.position(&canonical) {
                Some(idx) => {
                    if out[idx].is_some() {
                        tracing::debug!(column = %name, sensor = %canonical, "column collides with an earlier one; keeping the later");
                    }
                    out[idx] = Some(values.as_slice());
                }
                None => {
                    tracing::debug!(column = %name, "dropping unregistered column");
                }
            }
        }
        out
    }
}
