use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use log::LevelFilter;
use serde_json::json;
use storage_core::{ConsumerMode, FilterMode, Item, ItemType, ItemTypeSet, ModFilter, ViewOptions};
use storage_engine::{Collaborators, RefreshCoordinator};
use storage_logging::{refresh_info, refresh_warn, set_consumer_tick};

use super::config::{config_path, load_config, report_config_messages};
use super::demo::{
    DemoModes, DemoStorage, LogWaitIndicator, NameSorter, ALCHEMY_MOD, MATERIALS, POTIONS,
    SORT_BY_NAME, TOOLS,
};
use super::logging;

/// Something the scripted display does at a given consumer tick.
#[derive(Debug, Clone)]
enum DemoStep {
    Refresh { force_full: bool },
    Deposit(Item),
    Withdraw(ItemType),
    Options(ViewOptions),
    Mode(ConsumerMode),
}

fn script() -> Vec<(u64, DemoStep)> {
    let searching = |text: &str, filter: FilterMode| ViewOptions {
        filter,
        sort: SORT_BY_NAME,
        search_text: text.to_string(),
        ..ViewOptions::default()
    };
    vec![
        (0, DemoStep::Refresh { force_full: true }),
        (10, DemoStep::Deposit(Item::new(403, "Gel", 30))),
        (10, DemoStep::Deposit(Item::new(202, "Torch", 12))),
        // Two options changes in one tick coalesce into a single run.
        (20, DemoStep::Options(searching("wood", TOOLS))),
        (20, DemoStep::Options(searching("wood", MATERIALS))),
        (30, DemoStep::Options(searching("potion", TOOLS))),
        (
            40,
            DemoStep::Options(ViewOptions {
                mod_filter: ModFilter::Only(ALCHEMY_MOD),
                ..searching("healing", POTIONS)
            }),
        ),
        (50, DemoStep::Mode(ConsumerMode::Crafting)),
        (51, DemoStep::Refresh { force_full: false }),
        (60, DemoStep::Mode(ConsumerMode::default())),
        (60, DemoStep::Options(searching("", FilterMode::RECENT))),
        (70, DemoStep::Withdraw(ItemType(402))),
        (80, DemoStep::Options(searching("", FilterMode::ALL))),
    ]
}

pub fn run_app() -> anyhow::Result<()> {
    let (config, messages) = load_config(&config_path(std::env::args().nth(1)));
    logging::initialize(
        config.log_destination,
        config.level_filter().unwrap_or(LevelFilter::Info),
    );
    report_config_messages(&messages);

    let storage = Arc::new(DemoStorage::seeded());
    let mode = Rc::new(Cell::new(ConsumerMode::default()));
    let mut coordinator = RefreshCoordinator::new(
        config.refresh.clone(),
        Collaborators {
            storage: storage.clone(),
            sorter: Arc::new(NameSorter),
            modes: Box::new(DemoModes::new(mode.clone())),
            wait: Box::new(LogWaitIndicator),
        },
    );
    coordinator.subscribe(Box::new(|published| {
        let names: Vec<&str> = published.items().iter().map(|i| i.name.as_str()).collect();
        refresh_info!("Display now shows {} entries: {:?}", names.len(), names);
        if let Some(advisory) = published.advisory() {
            refresh_info!("Search advisory: {advisory}");
        }
    }));

    let mut steps = script().into_iter().peekable();
    let mut settled = false;
    for tick in 0..config.max_ticks {
        set_consumer_tick(tick);
        while let Some((_, step)) = steps.next_if(|(at, _)| *at <= tick) {
            apply_step(step, &mut coordinator, &storage, &mode);
        }

        coordinator.tick();

        if steps.peek().is_none()
            && !coordinator.currently_refreshing()
            && !coordinator.view().refresh_pending
        {
            settled = true;
            break;
        }
        thread::sleep(config.tick_interval());
    }
    if !settled {
        refresh_warn!(
            "Refresh did not settle within {} ticks",
            config.max_ticks
        );
    }

    let snapshot = json!({
        "refresh": coordinator.view(),
        "published": coordinator.published(),
        "advisory": coordinator.advisory().map(|advisory| advisory.to_string()),
    });
    let rendered =
        serde_json::to_string_pretty(&snapshot).context("rendering the published snapshot")?;
    println!("{rendered}");

    coordinator
        .shutdown()
        .context("stopping the active refresh run")?;
    Ok(())
}

fn apply_step(
    step: DemoStep,
    coordinator: &mut RefreshCoordinator,
    storage: &DemoStorage,
    mode: &Cell<ConsumerMode>,
) {
    refresh_info!("Demo step: {:?}", step);
    match step {
        DemoStep::Refresh { force_full } => coordinator.request_refresh(force_full),
        DemoStep::Deposit(item) => {
            let changed: ItemTypeSet = [item.item_type].into_iter().collect();
            storage.deposit(item);
            coordinator.request_item_types(changed);
        }
        DemoStep::Withdraw(item_type) => {
            storage.withdraw_all(item_type);
            coordinator.request_item_types([item_type].into_iter().collect());
        }
        DemoStep::Options(options) => coordinator.set_options(options),
        DemoStep::Mode(next) => mode.set(next),
    }
}
