//! Portal label → metric definition table.

use std::collections::HashMap;
use std::fmt;

pub const NAMESPACE: &str = "wemportal_";

/// Synthetic label carrying the page's "last data update" text.
pub const TIMESTAMP_LABEL: &str = "Zeitstempel";

// Unit suffix lengths in characters, as rendered by the portal.
const CELSIUS: usize = 3; // " °C"
const PERCENT: usize = 2; // " %"
const KELVIN: usize = 2; // " K"
const CUBIC_METER_PER_HOUR: usize = 4; // "m3/h"
const HERTZ: usize = 3; // " Hz"
const HOURS: usize = 2; // " h"
const KILOWATT_HOURS: usize = 4; // " KWh"

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
    Info,
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
            Self::Info => "info",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Info)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Caption shown by the portal; unique key of the catalog.
    pub label: &'static str,
    /// Metric name without the namespace prefix.
    pub name: &'static str,
    pub kind: MetricKind,
    /// Number of trailing characters (the unit) to drop before parsing.
    pub unit_strip: Option<usize>,
}

impl MetricDefinition {
    pub const fn gauge(label: &'static str, name: &'static str, unit_strip: usize) -> Self {
        Self { label, name, kind: MetricKind::Gauge, unit_strip: Some(unit_strip) }
    }

    pub const fn plain_gauge(label: &'static str, name: &'static str) -> Self {
        Self { label, name, kind: MetricKind::Gauge, unit_strip: None }
    }

    pub const fn counter(label: &'static str, name: &'static str) -> Self {
        Self { label, name, kind: MetricKind::Counter, unit_strip: None }
    }

    pub const fn info(label: &'static str, name: &'static str) -> Self {
        Self { label, name, kind: MetricKind::Info, unit_strip: None }
    }

    pub fn metric_name(&self) -> String {
        format!("{}{}", NAMESPACE, self.name)
    }
}

pub static DEFINITIONS: &[MetricDefinition] = &[
    MetricDefinition::info(TIMESTAMP_LABEL, "timestamp"),
    MetricDefinition::gauge("Außentemperatur", "current_outside_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("AT Mittelwert", "average_outside_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("AT Langzeitwert", "longtime_outside_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Raumsolltemperatur", "room_set_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Vorlaufsolltemperatur", "water_inlet_set_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Vorlauftemperatur", "water_inlet_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Warmwassertemperatur", "hot_water_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Leistungsanforderung", "performance_request_ratio", PERCENT),
    MetricDefinition::gauge("Schaltdifferenz dynamisch", "dynamic_switch_temperature_difference_kelvin", KELVIN),
    MetricDefinition::gauge("LWT", "lwt_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Rücklauftemperatur", "water_outlet_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Drehzahl Pumpe", "pump_rotation_ratio", PERCENT),
    MetricDefinition::gauge("Volumenstrom", "volume_flow_cubicmeter_per_hour", CUBIC_METER_PER_HOUR),
    MetricDefinition::info("Stellung Umschaltventil", "crossover_valve_setting"),
    MetricDefinition::gauge("Soll Frequenz Verdichter", "set_frequency_compressor_hertz", HERTZ),
    MetricDefinition::gauge("Ist Frequenz Verdichter", "frequency_compressor_hertz", HERTZ),
    MetricDefinition::gauge("Luftansaugtemperatur", "air_inlet_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Wärmetauscher AG Eintritt", "outside_heat_exchanger_inlet_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Wärmetauscher AG Mitte", "outside_heat_exchanger_middle_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Druckgas", "pressure_gas_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Wärmetauscher Innen", "inside_heat_exchanger_temperature_celsius", CELSIUS),
    MetricDefinition::gauge("Kältemittel Innen", "refrigerant_inside_temperature_celsius", CELSIUS),
    // Hour counters can be reset on the device, so they are gauges.
    MetricDefinition::gauge("Betriebsstd. Verdichter", "compressor_operating_hours", HOURS),
    MetricDefinition::counter("Schaltspiele Verdichter", "compressor_cycles"),
    MetricDefinition::counter("Schaltspiele Abtauen", "defrosting_cycles"),
    MetricDefinition::plain_gauge("Status E-Heizung 1", "heating1_state"),
    MetricDefinition::plain_gauge("Status E-Heizung 2", "heating2_state"),
    MetricDefinition::gauge("Betriebsstunden E1", "heating1_operating_hours", HOURS),
    MetricDefinition::gauge("Betriebsstunden E2", "heating2_operating_hours", HOURS),
    MetricDefinition::counter("Schaltspiele E1", "heating1_cycles"),
    MetricDefinition::counter("Schaltspiele E2", "heating2_cycles"),
    MetricDefinition::gauge("Gesamt Energie Tage", "total_energy_per_day", KILOWATT_HOURS),
    MetricDefinition::gauge("Gesamt Energie Monate", "total_energy_per_month", KILOWATT_HOURS),
    MetricDefinition::gauge("Gesamt Energie Jahre", "total_energy_per_year", KILOWATT_HOURS),
    MetricDefinition::gauge("Heizen Energie Tage", "heating_energy_per_day", KILOWATT_HOURS),
    MetricDefinition::gauge("Heizen Energie Monat", "heating_energy_per_month", KILOWATT_HOURS),
    MetricDefinition::gauge("Heizen Energie Jahre", "heating_energy_per_year", KILOWATT_HOURS),
    MetricDefinition::gauge("WW Energie Tag", "water_energy_per_day", KILOWATT_HOURS),
    MetricDefinition::gauge("WW Energie Monat", "water_energy_per_month", KILOWATT_HOURS),
    MetricDefinition::gauge("WW Energie Jahr", "water_energy_per_year", KILOWATT_HOURS),
    MetricDefinition::gauge("Kühlen Energie Tage", "cooling_energy_per_day", KILOWATT_HOURS),
    MetricDefinition::gauge("Kühlen Energie Monate", "cooling_energy_per_month", KILOWATT_HOURS),
    MetricDefinition::gauge("Kühlen Energie Jahre", "cooling_energy_per_year", KILOWATT_HOURS),
];

/// Immutable lookup over a definition table, built once at startup.
#[derive(Debug)]
pub struct MetricCatalog {
    definitions: &'static [MetricDefinition],
    by_label: HashMap<&'static str, usize>,
}

impl MetricCatalog {
    pub fn new(definitions: &'static [MetricDefinition]) -> Self {
        let by_label = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.label, i))
            .collect();
        Self { definitions, by_label }
    }

    pub fn standard() -> Self {
        Self::new(DEFINITIONS)
    }

    pub fn lookup(&self, label: &str) -> Option<&MetricDefinition> {
        self.by_label.get(label).map(|&i| &self.definitions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
