use super::ui;
use crate::core::MetricCategory;
use comfy_table::Cell;

pub fn display_as_table() -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Label"),
        ui::header_cell("Provider"),
    ]);
    for category in MetricCategory::ALL {
        table.add_row(vec![
            Cell::new(category.to_string()),
            Cell::new(category.label()),
            Cell::new(category.provider().to_string()),
        ]);
    }
    table.to_string()
}

pub fn run() {
    println!("{}", display_as_table());
}
