//! View state of the transaction table: column projection, search filter,
//! sorting, grouping and paging. The grid never reorders the controller's
//! list; every row it produces refers back to a record by index.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::PAGE_SIZES;
use crate::core::blocks::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Hash,
    BlockNumber,
    From,
    To,
    Nonce,
    ChainId,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Hash,
        Column::BlockNumber,
        Column::From,
        Column::To,
        Column::Nonce,
        Column::ChainId,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Column::Hash => "hash",
            Column::BlockNumber => "blockNumber",
            Column::From => "from",
            Column::To => "to",
            Column::Nonce => "nonce",
            Column::ChainId => "chainId",
        }
    }

    pub fn cell(self, record: &Record) -> String {
        match self {
            Column::Hash => format!("{:?}", record.hash),
            Column::BlockNumber => record.block_number.map(|n| n.to_string()).unwrap_or_default(),
            Column::From => format!("{:?}", record.from),
            Column::To => record.to.map(|a| format!("{:?}", a)).unwrap_or_default(),
            Column::Nonce => record.nonce.to_string(),
            Column::ChainId => record.chain_id.map(|n| n.to_string()).unwrap_or_default(),
        }
    }

    fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            Column::Hash => a.hash.cmp(&b.hash),
            Column::BlockNumber => a.block_number.cmp(&b.block_number),
            Column::From => a.from.cmp(&b.from),
            Column::To => a.to.cmp(&b.to),
            Column::Nonce => a.nonce.cmp(&b.nonce),
            Column::ChainId => a.chain_id.cmp(&b.chain_id),
        }
    }

    /// Cycles `None -> hash -> ... -> chainId -> None`.
    fn cycle(current: Option<Column>) -> Option<Column> {
        match current {
            None => Some(Column::ALL[0]),
            Some(col) => {
                let pos = Column::ALL.iter().position(|c| *c == col).unwrap_or(0);
                Column::ALL.get(pos + 1).copied()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridRow {
    Group {
        label: String,
        count: usize,
        expanded: bool,
    },
    Record {
        index: usize,
    },
}

#[derive(Debug, Clone)]
pub struct GridView {
    search: String,
    case_sensitive: bool,
    sort: Option<(Column, SortOrder)>,
    group_by: Option<Column>,
    expanded: HashSet<String>,
    page_size: usize,
    cursor: usize,
}

impl GridView {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            case_sensitive: true,
            sort: None,
            group_by: None,
            expanded: HashSet::new(),
            page_size: if PAGE_SIZES.contains(&page_size) { page_size } else { PAGE_SIZES[0] },
            cursor: 0,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
        self.cursor = 0;
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn toggle_case_sensitive(&mut self) {
        self.case_sensitive = !self.case_sensitive;
        self.cursor = 0;
    }

    pub fn sort(&self) -> Option<(Column, SortOrder)> {
        self.sort
    }

    pub fn set_sort(&mut self, sort: Option<(Column, SortOrder)>) {
        self.sort = sort;
    }

    pub fn cycle_sort(&mut self) {
        let order = self.sort.map(|(_, o)| o).unwrap_or(SortOrder::Ascending);
        self.sort = Column::cycle(self.sort.map(|(c, _)| c)).map(|c| (c, order));
    }

    pub fn flip_sort_order(&mut self) {
        if let Some((col, order)) = self.sort {
            let flipped = match order {
                SortOrder::Ascending => SortOrder::Descending,
                SortOrder::Descending => SortOrder::Ascending,
            };
            self.sort = Some((col, flipped));
        }
    }

    pub fn group_by(&self) -> Option<Column> {
        self.group_by
    }

    pub fn set_group_by(&mut self, column: Option<Column>) {
        self.group_by = column;
        self.expanded.clear();
        self.cursor = 0;
    }

    pub fn cycle_group_by(&mut self) {
        self.set_group_by(Column::cycle(self.group_by));
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Steps through the allowed page sizes, staying at either end.
    pub fn step_page_size(&mut self, larger: bool) {
        let pos = PAGE_SIZES.iter().position(|s| *s == self.page_size).unwrap_or(0);
        let next = if larger {
            (pos + 1).min(PAGE_SIZES.len() - 1)
        } else {
            pos.saturating_sub(1)
        };
        self.page_size = PAGE_SIZES[next];
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Back to the first row with all groups collapsed, for a freshly loaded list.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.expanded.clear();
    }

    fn matches(&self, record: &Record) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = if self.case_sensitive {
            self.search.clone()
        } else {
            self.search.to_lowercase()
        };
        Column::ALL.iter().any(|col| {
            let cell = col.cell(record);
            if self.case_sensitive {
                cell.contains(&needle)
            } else {
                cell.to_lowercase().contains(&needle)
            }
        })
    }

    fn ordered(&self, records: &[Record], mut indices: Vec<usize>) -> Vec<usize> {
        if let Some((col, order)) = self.sort {
            indices.sort_by(|&a, &b| {
                let ord = col.compare(&records[a], &records[b]);
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        indices
    }

    /// Rows to display for `records`, before paging.
    pub fn rows(&self, records: &[Record]) -> Vec<GridRow> {
        let matching: Vec<usize> = (0..records.len())
            .filter(|&i| self.matches(&records[i]))
            .collect();
        let ordered = self.ordered(records, matching);

        let Some(group_col) = self.group_by else {
            return ordered.into_iter().map(|index| GridRow::Record { index }).collect();
        };

        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for index in ordered {
            let label = group_col.cell(&records[index]);
            match groups.iter_mut().find(|(l, _)| *l == label) {
                Some((_, members)) => members.push(index),
                None => groups.push((label, vec![index])),
            }
        }
        let descending = matches!(self.sort, Some((col, SortOrder::Descending)) if col == group_col);
        groups.sort_by(|(_, a), (_, b)| {
            let ord = group_col.compare(&records[a[0]], &records[b[0]]);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let mut rows = Vec::new();
        for (label, members) in groups {
            let expanded = self.expanded.contains(&label);
            rows.push(GridRow::Group {
                label,
                count: members.len(),
                expanded,
            });
            if expanded {
                rows.extend(members.into_iter().map(|index| GridRow::Record { index }));
            }
        }
        rows
    }

    pub fn page(&self) -> usize {
        self.cursor / self.page_size
    }

    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size).max(1)
    }

    /// The slice of `rows` on the cursor's page and its offset.
    pub fn visible<'a>(&self, rows: &'a [GridRow]) -> (usize, &'a [GridRow]) {
        let start = (self.page() * self.page_size).min(rows.len());
        let end = (start + self.page_size).min(rows.len());
        (start, &rows[start..end])
    }

    pub fn move_by(&mut self, delta: isize, row_count: usize) {
        if row_count == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, row_count as isize - 1) as usize;
    }

    pub fn page_down(&mut self, row_count: usize) {
        self.move_by(self.page_size as isize, row_count);
    }

    pub fn page_up(&mut self, row_count: usize) {
        self.move_by(-(self.page_size as isize), row_count);
    }

    /// Record index under the cursor, if the cursor is on a record row.
    pub fn cursor_record(&self, rows: &[GridRow]) -> Option<usize> {
        match rows.get(self.cursor) {
            Some(GridRow::Record { index }) => Some(*index),
            _ => None,
        }
    }

    /// Expands or collapses the group under the cursor.
    pub fn toggle_group(&mut self, rows: &[GridRow]) -> bool {
        match rows.get(self.cursor) {
            Some(GridRow::Group { label, .. }) => {
                if !self.expanded.remove(label) {
                    self.expanded.insert(label.clone());
                }
                true
            }
            _ => false,
        }
    }

    /// Expands the group holding record `index` so that it gets a row.
    pub fn reveal_record(&mut self, index: usize, records: &[Record]) {
        if let (Some(col), Some(record)) = (self.group_by, records.get(index)) {
            self.expanded.insert(col.cell(record));
        }
    }

    /// Moves the cursor onto the row showing record `index`. False when no
    /// row shows it.
    pub fn focus_record(&mut self, index: usize, rows: &[GridRow]) -> bool {
        match rows
            .iter()
            .position(|row| *row == GridRow::Record { index })
        {
            Some(pos) => {
                self.cursor = pos;
                true
            }
            None => false,
        }
    }
}
