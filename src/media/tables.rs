use redb::TableDefinition;

/// Trash entries: trash_name -> TrashEntry (msgpack)
pub const TRASH_ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("trash_entries");
