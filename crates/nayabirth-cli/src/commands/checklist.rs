use chrono::Utc;
use clap::Subcommand;
use nayabirth_core::storage::Database;
use nayabirth_core::{ChecklistProgress, ChecklistState, HospitalChecklist, KeyValueStore};
use serde::Serialize;

#[derive(Subcommand)]
pub enum ChecklistAction {
    /// Print the packing list
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check or uncheck an item
    Toggle {
        /// Item id as shown by `show`
        item: String,
    },
    /// Add your own item to a category
    Add {
        /// Category id (documents, mom, baby, partner)
        category: String,
        /// Item label
        label: String,
    },
    /// Remove an item you added
    Remove {
        /// Custom item id
        item: String,
    },
    /// Expand or collapse a category
    Fold {
        /// Category id
        category: String,
    },
    /// Uncheck everything and drop custom items
    Reset,
}

#[derive(Serialize)]
struct ChecklistView<'a> {
    progress: ChecklistProgress,
    #[serde(flatten)]
    state: &'a ChecklistState,
    hospital_provides: &'a [String],
}

fn print_list<S: KeyValueStore>(checklist: &HospitalChecklist<S>) {
    let state = checklist.state();
    let progress = checklist.progress();
    println!("Packed {}/{}", progress.checked, progress.total);
    for category in &checklist.catalog().categories {
        let expanded = state.is_expanded(&category.id);
        println!();
        println!(
            "{} {} [{}]",
            if expanded { "v" } else { ">" },
            category.title,
            category.id
        );
        if !expanded {
            continue;
        }
        let base = category
            .items
            .iter()
            .map(|item| (&item.id, &item.label, item.essential));
        let custom = state
            .custom_items(&category.id)
            .iter()
            .map(|item| (&item.id, &item.label, false));
        for (id, label, essential) in base.chain(custom) {
            println!(
                "  [{}] {}{}  ({})",
                if state.is_checked(id) { "x" } else { " " },
                label,
                if essential { " *" } else { "" },
                id
            );
        }
    }
    println!();
    println!("Usually provided: {}", checklist.catalog().hospital_provides.join(", "));
}

pub fn run(action: ChecklistAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut checklist = HospitalChecklist::open(db);

    let now = Utc::now();
    let event = match action {
        ChecklistAction::Show { json } => {
            if json {
                let view = ChecklistView {
                    progress: checklist.progress(),
                    state: checklist.state(),
                    hospital_provides: &checklist.catalog().hospital_provides,
                };
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_list(&checklist);
            }
            return Ok(());
        }
        ChecklistAction::Toggle { item } => checklist
            .toggle_item_at(&item, now)
            .ok_or_else(|| format!("unknown item: {item}"))?,
        ChecklistAction::Add { category, label } => checklist
            .add_custom_item_at(&category, &label, now)
            .ok_or_else(|| format!("cannot add '{label}' to category '{category}'"))?,
        ChecklistAction::Remove { item } => checklist
            .remove_custom_item_at(&item, now)
            .ok_or_else(|| format!("no custom item with id {item}"))?,
        ChecklistAction::Fold { category } => checklist
            .toggle_category_at(&category, now)
            .ok_or_else(|| format!("unknown category: {category}"))?,
        ChecklistAction::Reset => checklist.reset_at(now),
    };
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
