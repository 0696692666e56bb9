use storage_core::{FilterMode, Item, ModFilter, SortMode};
use storage_logging::{refresh_debug, refresh_info};

use crate::{RefreshContext, RefreshError, RefreshSettings, SearchAdvisory, SortFilterEngine};

/// Filters, sorts and aggregates `context.candidates()` into the context's
/// result buffers, relaxing the category and mod filters when a search
/// matches nothing.
///
/// Returns the advisory to show next to the search box, or `None` when no
/// constraint had to be dropped. On cancellation the result buffers are left
/// empty and [`RefreshError::Cancelled`] is returned.
pub fn run_pipeline(
    context: &mut RefreshContext,
    sorter: &dyn SortFilterEngine,
    settings: &RefreshSettings,
) -> Result<Option<SearchAdvisory>, RefreshError> {
    context.init_task_schedule(settings.task_count, &settings.task_label);

    filter_pass(context, sorter, settings)?;

    let mut advisory = None;
    if !context.search_text().trim().is_empty() {
        if context.result_items().is_empty() && context.filter() != FilterMode::ALL {
            refresh_info!("No items passed the filter. Attempting filter with All setting");
            context.set_filter(FilterMode::ALL);
            advisory = Some(SearchAdvisory::DefaultedToAllItems);
            context.reset_task_completion();
            filter_pass(context, sorter, settings)?;
        }

        if context.result_items().is_empty() && context.mod_filter() != ModFilter::AllMods {
            refresh_info!("No items passed the filter. Attempting filter with All Mods setting");
            context.set_mod_filter(ModFilter::AllMods);
            advisory = Some(SearchAdvisory::DefaultedToAllMods);
            context.reset_task_completion();
            filter_pass(context, sorter, settings)?;
        }
    }

    Ok(advisory)
}

fn filter_pass(
    context: &mut RefreshContext,
    sorter: &dyn SortFilterEngine,
    settings: &RefreshSettings,
) -> Result<(), RefreshError> {
    let result = apply_filters(context, sorter, settings);
    if matches!(result, Err(RefreshError::Cancelled)) {
        context.clear_results();
    }
    result
}

fn apply_filters(
    context: &mut RefreshContext,
    sorter: &dyn SortFilterEngine,
    settings: &RefreshSettings,
) -> Result<(), RefreshError> {
    context.check_cancelled()?;
    refresh_debug!("Applying item filters... (run {})", context.run_id());

    let aggregate = !context.item_deletion();
    let output = if context.filter() == FilterMode::RECENT {
        if context.sort() == SortMode::DEFAULT {
            context.set_sort(SortMode::UNSPECIFIED);
        }
        // Candidates are already in recency order; only the cap distinguishes the filter now.
        context.set_filter(FilterMode::ALL);
        sorter.sort_and_filter(context, Some(settings.recent_cap), aggregate)?
    } else {
        sorter.sort_and_filter(context, None, aggregate)?
    };
    context.check_cancelled()?;

    if output.items.len() != output.source_groups.len() {
        return Err(RefreshError::Sorter(format!(
            "{} display items but {} source groups",
            output.items.len(),
            output.source_groups.len()
        )));
    }
    context.complete_task();

    let mut entries: Vec<(Item, Vec<Item>)> =
        output.items.into_iter().zip(output.source_groups).collect();
    if settings.favoriting_enabled {
        // Stable: relative order inside both partitions is kept.
        entries.sort_by_key(|(item, _)| !item.favorited);
    }
    context.complete_task();

    context.check_cancelled()?;
    context.clear_results();
    let only_favorites = settings.favoriting_enabled && context.only_favorites();
    for (item, group) in entries {
        if !only_favorites || item.favorited {
            context.push_result(item, group);
        }
    }
    context.complete_task();
    context.complete_task();

    refresh_info!(
        "Filtering applied. Item count: {}",
        context.result_items().len()
    );
    Ok(())
}
