//! End-to-end tests over a three-entry layout:
//!
//! ```text
//! |-------- shader1.fxc ---------||--- shader2.fxc ---||--------- shader3.fxc -----|
//! | 0 s s 3 s s s s 8 s 10 s s s || s s 2 3 4 s s s s || 0 s s s 4 s s s 8 9 s s s |
//!   0                          13   14              22   23                      35
//! ```

use shadercompile_core::{ComboError, ComboHandle, ComboParam, Configuration, EntryDef};

fn layout(shader2_last_valid: bool) -> Configuration {
    let entry = |name: &str, combos: i32| {
        EntryDef::new(name.replace(".fxc", "_ps30"), name, "ps_3_0")
            .with_static(ComboParam::new("S", 0, combos - 1))
    };
    Configuration::from_entries([
        entry("shader1.fxc", 14).with_validity(|s: u64| matches!(s, 0 | 3 | 8 | 10)),
        entry("shader2.fxc", 9)
            .with_validity(move |s: u64| matches!(s, 2..=4) || (shader2_last_valid && s == 8)),
        entry("shader3.fxc", 13).with_validity(|s: u64| matches!(s, 0 | 4 | 8 | 9)),
    ])
    .unwrap()
}

fn reference() -> Configuration {
    layout(false)
}

fn file_of(combo: &ComboHandle<'_>) -> String {
    combo.entry_info().unwrap().shader_file_name.clone()
}

#[test]
fn test_ranges_cover_command_space() {
    let config = reference();
    let infos: Vec<_> = config.describe().collect();

    assert_eq!(infos[0].command_start, 0);
    for pair in infos.windows(2) {
        assert_eq!(pair[0].command_end, pair[1].command_start);
    }
    assert_eq!(infos.last().unwrap().command_end, config.total_command_count());
    assert_eq!(config.total_command_count(), 36);

    let ranges: Vec<_> = infos
        .iter()
        .map(|info| (info.command_start, info.command_end))
        .collect();
    assert_eq!(ranges, vec![(0, 14), (14, 23), (23, 36)]);
}

#[test]
fn test_get_section() {
    let config = reference();
    assert_eq!(config.get_section(10).unwrap().shader_file_name, "shader1.fxc");
    assert_eq!(config.get_section(27).unwrap().shader_file_name, "shader3.fxc");

    for command in 0..config.total_command_count() {
        let owners: Vec<_> = config
            .describe()
            .filter(|info| info.contains(command))
            .collect();
        assert_eq!(owners.len(), 1);
        assert_eq!(config.get_section(command), Some(owners[0]));
    }
    assert!(config.get_section(36).is_none());
    assert!(config.get_section(u64::MAX).is_none());
}

#[test]
fn test_next_within_entry() {
    let config = reference();
    let mut command = 3;
    let mut combo = config.combo(3).unwrap();

    assert_eq!(config.next_combo(&mut command, &mut combo, 14), Ok(true));
    assert_eq!(command, 8);
    assert_eq!(file_of(&combo), "shader1.fxc");
    assert_eq!(combo.combo_num(), Ok(8));
}

#[test]
fn test_next_exhausts_before_end() {
    let config = reference();
    let mut command = 10;
    let mut combo = config.combo(10).unwrap();

    assert_eq!(config.next_combo(&mut command, &mut combo, 14), Ok(false));
    assert_eq!(command, 14);
    assert!(!combo.is_bound());
}

#[test]
fn test_next_fresh_crosses_entry() {
    let config = reference();
    let mut command = 22;
    let mut combo = ComboHandle::unbound();

    assert_eq!(config.next_combo(&mut command, &mut combo, 36), Ok(true));
    assert_eq!(command, 23);
    assert_eq!(file_of(&combo), "shader3.fxc");
    assert_eq!(combo.combo_num(), Ok(0));
}

#[test]
fn test_next_fresh_within_entry() {
    let config = reference();
    let mut command = 29;
    let mut combo = ComboHandle::unbound();

    assert_eq!(config.next_combo(&mut command, &mut combo, 36), Ok(true));
    assert_eq!(command, 31);
    assert_eq!(file_of(&combo), "shader3.fxc");
    assert_eq!(combo.combo_num(), Ok(8));
}

#[test]
fn test_bound_handle_crosses_entry() {
    let config = reference();
    let mut command = 18;
    let mut combo = config.combo(18).unwrap();

    assert_eq!(config.next_combo(&mut command, &mut combo, 36), Ok(true));
    assert_eq!(command, 23);
    assert_eq!(file_of(&combo), "shader3.fxc");
}

#[test]
fn test_bound_at_last_slot_of_entry_crosses() {
    let config = layout(true);
    let mut command = 22;
    let mut combo = ComboHandle::unbound();

    // A fresh start includes the cursor
    assert_eq!(config.next_combo(&mut command, &mut combo, 36), Ok(true));
    assert_eq!(command, 22);
    assert_eq!(file_of(&combo), "shader2.fxc");
    assert_eq!(combo.combo_num(), Ok(8));

    // Bound at 22, the search starts after it
    assert_eq!(config.next_combo(&mut command, &mut combo, 36), Ok(true));
    assert_eq!(command, 23);
    assert_eq!(file_of(&combo), "shader3.fxc");
    assert_eq!(combo.combo_num(), Ok(0));
}

#[test]
fn test_round_trip_for_valid_commands() {
    let config = reference();
    let valid: Vec<u64> = (0..36)
        .filter_map(|c| config.combo(c))
        .map(|handle| handle.command_num().unwrap())
        .collect();
    assert_eq!(valid, vec![0, 3, 8, 10, 16, 17, 18, 23, 27, 31, 32]);
}

#[test]
fn test_iteration_is_strictly_increasing_from_any_start() {
    let config = reference();
    let all_valid: Vec<u64> = (0..36).filter(|&c| config.combo(c).is_some()).collect();

    for start in 0..=36 {
        for end in start..=40 {
            let mut command = start;
            let mut combo = ComboHandle::unbound();
            let mut seen = Vec::new();
            while config.next_combo(&mut command, &mut combo, end).unwrap() {
                assert!(seen.last().is_none_or(|&prev| command > prev));
                assert!(command < end);
                seen.push(command);
            }
            assert_eq!(command, end);

            let expected: Vec<u64> = all_valid
                .iter()
                .copied()
                .filter(|&c| c >= start && c < end)
                .collect();
            assert_eq!(seen, expected, "range {start}..{end}");
        }
    }
}

#[test]
fn test_copy_independence() {
    let config = reference();
    let mut command = 0;
    let mut walker = config.combo(0).unwrap();
    let copy = ComboHandle::alloc(Some(&walker)).unwrap();

    config.next_combo(&mut command, &mut walker, 36).unwrap();
    assert_eq!(walker.command_num(), Ok(3));
    assert_eq!(copy.command_num(), Ok(0));

    let mut other = ComboHandle::alloc(None).unwrap();
    other.assign(&walker).unwrap();
    config.next_combo(&mut command, &mut walker, 36).unwrap();
    assert_eq!(other.command_num(), Ok(3));
    assert_eq!(walker.command_num(), Ok(8));
}

#[test]
fn test_free_sets_sentinel() {
    let config = reference();
    let mut combo = config.combo(16).unwrap();
    combo.free().unwrap();
    assert_eq!(combo.entry_info(), Err(ComboError::Freed));

    let mut command = 16;
    assert_eq!(
        config.next_combo(&mut command, &mut combo, 36),
        Err(ComboError::Freed)
    );
}

#[test]
fn test_workers_partition_by_range() {
    let config = reference();
    let bounds = [0u64, 5, 14, 20, 30, 36];

    let counts: Vec<u64> = std::thread::scope(|scope| {
        let workers: Vec<_> = bounds
            .windows(2)
            .map(|range| {
                let config = &config;
                let (start, end) = (range[0], range[1]);
                scope.spawn(move || {
                    let mut command = start;
                    let mut combo = ComboHandle::unbound();
                    let mut count = 0;
                    while config.next_combo(&mut command, &mut combo, end).unwrap() {
                        count += 1;
                    }
                    count
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(counts, vec![2, 2, 3, 2, 2]);
    assert_eq!(counts.iter().sum::<u64>(), config.count_valid(0..36));
}
