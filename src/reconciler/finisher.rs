use super::config::TableStructureState;
use super::handler::DriftReport;
use super::state::PassState;
use crate::meta::{TableMeta, init_table_meta};
use tracing::{debug, warn};

/// Terminal transition of a pass: picks the meta, reports drift, notifies the handler.
pub(crate) fn finish(state: &PassState, structure: &TableStructureState) {
    let table = state.table.name();
    let groups = structure.structure_sql_map();

    let table_meta = match groups.len() {
        0 => {
            warn!(%table, "no data node reported a table structure");
            None
        }
        1 => groups.keys().next().and_then(|ddl| build_meta(state, ddl)),
        _ => {
            // Different text can still be the same table, e.g. AUTO_INCREMENT=N.
            let mut distinct: Vec<TableMeta> = Vec::new();
            let mut chosen = None;
            for ddl in groups.keys() {
                let Some(meta) = build_meta(state, ddl) else {
                    continue;
                };
                if !distinct.contains(&meta) {
                    distinct.push(meta.clone());
                }
                chosen = Some(meta);
            }

            if distinct.len() > 1 {
                let report = DriftReport::from_structure(table, groups);
                consistent_warning(&report);
                state.handler.drift_detected(&report);
            } else {
                debug!(%table, groups = groups.len(), "textual differences only, structures match");
            }
            chosen
        }
    };

    state.handler.handle_table(table_meta);
    state.handler.countdown();
}

fn build_meta(state: &PassState, ddl: &str) -> Option<TableMeta> {
    let table = state.table.name();
    match init_table_meta(state.parser.as_ref(), table, ddl, state.version) {
        Ok(meta) => Some(meta),
        Err(err) => {
            warn!(%table, error = %err, "failed to parse table structure: {}", ddl);
            None
        }
    }
}

fn consistent_warning(report: &DriftReport) {
    warn!(table = %report.table, "Table [{}] structure are not consistent!", report.table);
    warn!("Currently detected: ");
    for group in &report.groups {
        warn!(table = %report.table, "{}", group);
    }
}
