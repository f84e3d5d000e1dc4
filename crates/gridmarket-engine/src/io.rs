//! Reading the input document and writing the report.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use gridmarket_types::{MarketReport, SimulationInput};

use crate::error::EngineError;

/// Parse an input document.
///
/// # Errors
///
/// Returns [`EngineError::InputJson`] if a field is missing or has the
/// wrong type.
pub fn parse_input(document: &str) -> Result<SimulationInput, EngineError> {
    Ok(serde_json::from_str(document)?)
}

/// Read and parse the input document at `path`.
///
/// # Errors
///
/// Returns [`EngineError::InputIo`] if the file cannot be read, or
/// [`EngineError::InputJson`] if it is not a valid document.
pub fn read_input(path: &Path) -> Result<SimulationInput, EngineError> {
    let document = std::fs::read_to_string(path).map_err(|source| EngineError::InputIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_input(&document)
}

/// Write `report` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`EngineError::Output`] if the file cannot be created or written.
pub fn write_report(path: &Path, report: &MarketReport) -> Result<(), EngineError> {
    let output_error = |source| EngineError::Output {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(output_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|err| output_error(std::io::Error::from(err)))?;
    writer.write_all(b"\n").map_err(output_error)?;
    writer.flush().map_err(output_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::PathBuf;

    use gridmarket_types::{EnergyType, StrategyKind};
    use rust_decimal::Decimal;

    use super::*;

    const DOCUMENT: &str = r#"{
      "numberOfTurns": 1,
      "initialData": {
        "consumers": [ { "id": 0, "initialBudget": 10, "monthlyIncome": 5 } ],
        "distributors": [
          { "id": 0, "contractLength": 2, "initialBudget": 50,
            "initialInfrastructureCost": 3, "energyNeededKW": 100,
            "producerStrategy": "GREEN" }
        ],
        "producers": [
          { "id": 0, "energyType": "HYDRO", "maxDistributors": 1,
            "priceKW": 0.25, "energyPerDistributor": 100 }
        ]
      },
      "monthlyUpdates": [
        { "newConsumers": [], "distributorChanges": [], "producerChanges": [] }
      ]
    }"#;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gridmarket-{}-{name}", std::process::id()))
    }

    #[test]
    fn parses_a_complete_document() {
        let input = parse_input(DOCUMENT).unwrap();
        assert_eq!(input.number_of_turns, 1);
        let distributor = &input.initial_data.distributors[0];
        assert_eq!(distributor.producer_strategy, StrategyKind::Green);
        assert_eq!(distributor.energy_needed_kw, 100);
        let producer = &input.initial_data.producers[0];
        assert_eq!(producer.energy_type, EnergyType::Hydro);
        assert_eq!(producer.price_kw, Decimal::new(25, 2));
        let update = &input.monthly_updates[0];
        assert!(update.new_consumers.is_empty());
        assert!(update.distributor_changes.is_empty());
        assert!(update.producer_changes.is_empty());
    }

    #[test]
    fn missing_field_is_malformed() {
        let result = parse_input(r#"{ "numberOfTurns": 1 }"#);
        assert!(matches!(result, Err(EngineError::InputJson { .. })));

        let bad_strategy = DOCUMENT.replace("GREEN", "CHEAPEST");
        assert!(parse_input(&bad_strategy).is_err());

        let bare_update = DOCUMENT.replace(
            r#"{ "newConsumers": [], "distributorChanges": [], "producerChanges": [] }"#,
            "{}",
        );
        assert!(matches!(
            parse_input(&bare_update),
            Err(EngineError::InputJson { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let path = temp_path("does-not-exist.json");
        let err = read_input(&path).unwrap_err();
        assert!(matches!(err, EngineError::InputIo { .. }));
        assert!(err.to_string().contains("does-not-exist.json"));
    }

    #[test]
    fn report_round_trips_through_a_file() {
        let input_path = temp_path("input.json");
        std::fs::write(&input_path, DOCUMENT).unwrap();
        let input = read_input(&input_path).unwrap();

        let report = crate::simulate(&input, &gridmarket_core::SimulationConfig::default()).unwrap();
        let output_path = temp_path("output.json");
        write_report(&output_path, &report).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(written["consumers"][0]["id"], 0);
        assert_eq!(written["distributors"][0]["producerStrategy"], "GREEN");
        assert_eq!(written["energyProducers"][0]["priceKW"], 0.25);
        assert_eq!(
            written["energyProducers"][0]["monthlyStats"][0]["distributorsIds"],
            serde_json::json!([0])
        );

        std::fs::remove_file(input_path).unwrap();
        std::fs::remove_file(output_path).unwrap();
    }
}
