use super::CREATE_TABLE_COLUMN;
use super::finisher;
use super::state::PassState;
use crate::cluster::{ProbeCallback, ProbeResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the callback that feeds one data node's probe result into `state`.
pub(crate) fn probe_callback(state: Arc<PassState>, data_node: String) -> ProbeCallback {
    Box::new(move |result| on_probe_result(&state, &data_node, result))
}

/// Records a probe result and, on the last one, runs the finisher.
///
/// The table's structure write lock is held for the whole body, including the
/// finisher, so callbacks of one table never interleave.
pub(crate) fn on_probe_result(state: &PassState, data_node: &str, result: ProbeResult) {
    let _entered = state.span.enter();
    let table = state.table.name();
    let mut structure = state.table.write_structure();

    // A result past zero belongs to a finished pass and must not touch the map.
    let Some(outstanding) = state.decrement() else {
        warn!(
            %table,
            %data_node,
            "probe result arrived after the pass finished, ignoring"
        );
        return;
    };

    match result.column(CREATE_TABLE_COLUMN) {
        Some(ddl) if result.success => {
            structure.record(ddl, data_node);
            debug!(%data_node, groups = structure.group_count(), "table structure recorded");
        }
        _ => {
            warn!(
                %table,
                %data_node,
                error = result.error.as_deref().unwrap_or("no result row"),
                "Can't get table {}'s config from DataNode:{}! Maybe the table is not initialized!",
                table,
                data_node
            );
        }
    }

    if outstanding == 0 {
        finisher::finish(state, &structure);
    } else {
        debug!(%data_node, outstanding, "waiting for data nodes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TableMeta;
    use crate::parser::MySqlDdlParser;
    use crate::reconciler::config::TableConfig;
    use crate::reconciler::handler::TableMetaHandler;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        handled: AtomicUsize,
    }

    impl TableMetaHandler for CountingHandler {
        fn handle_table(&self, _table_meta: Option<TableMeta>) {
            self.handled.fetch_add(1, Ordering::SeqCst);
        }
        fn countdown(&self) {}
    }

    fn ddl_row(ddl: &str) -> ProbeResult {
        let mut row = HashMap::new();
        row.insert(CREATE_TABLE_COLUMN.to_string(), ddl.to_string());
        ProbeResult::success(row)
    }

    #[test]
    fn late_result_leaves_structure_untouched() {
        let table = Arc::new(TableConfig::new("t", vec!["dn1".into()]).unwrap());
        let handler = Arc::new(CountingHandler::default());
        let state = PassState::new(
            "db",
            Arc::clone(&table),
            Arc::new(MySqlDdlParser::new()),
            handler.clone(),
        );

        on_probe_result(&state, "dn1", ddl_row("CREATE TABLE t (a INT)"));
        on_probe_result(&state, "dn1", ddl_row("CREATE TABLE t (b INT)"));

        let groups = table.structure_snapshot().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["CREATE TABLE t (a INT)"], vec!["dn1"]);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
        assert_eq!(state.outstanding(), 0);
    }
}
