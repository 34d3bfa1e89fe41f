use std::collections::BTreeMap;
use std::sync::Mutex;

use pit_strategy_lib::sim::{
    default_roster, Compounds, DriverState, LapSnapshot, Race, RaceOutcome, Season,
    StrategyEntry, TireSpec,
};
use pit_strategy_lib::{run_season, SeasonConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn quiet(_: u32, _: &LapSnapshot) {}

#[test]
fn two_drivers_on_one_stint() {
    let soft = TireSpec::shared("soft", 10, 0.1).unwrap();
    let roster: Vec<DriverState> = ["Alice", "Bob"]
        .into_iter()
        .map(|name| {
            DriverState::new(name, vec![soft.clone()], vec![StrategyEntry::new(&soft, 999)])
                .unwrap()
        })
        .collect();
    let snapshots = Mutex::new(Vec::new());
    let observer = |_: u32, s: &LapSnapshot| snapshots.lock().unwrap().push(s.clone());

    let mut race = Race::new(1, roster, 3);
    let result = race
        .run(&mut ChaCha8Rng::seed_from_u64(0), &observer)
        .unwrap();

    for driver in race.drivers() {
        assert_eq!(driver.pit_stop_count, 0);
        assert_eq!(driver.lap_times.len(), 3);
        assert_eq!(driver.current_tire.current_lap(), 3);
    }
    assert_eq!(result.classification.len(), 2);

    let snapshots = snapshots.into_inner().unwrap();
    assert_eq!(snapshots.len(), 3);
    for snapshot in &snapshots {
        let times: Vec<f64> = snapshot.rows.iter().map(|r| r.total_time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        let positions: Vec<u32> = snapshot.rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }
}

#[test]
fn concurrent_season_matches_sequential() {
    let compounds = Compounds::standard().unwrap();
    // No stop is planned before the softs wear out, so the RNG picks tires
    let factory = |_: u32| -> Result<Vec<DriverState>, _> {
        (1..=9)
            .map(|i| {
                DriverState::new(
                    format!("Driver {i}"),
                    compounds.all(),
                    vec![
                        StrategyEntry::new(&compounds.soft, 999),
                        StrategyEntry::new(&compounds.medium, 15 + i),
                    ],
                )
            })
            .collect()
    };
    let season = Season::new(6, 40, Some(2024));

    let concurrent = season.run(factory, &quiet);
    let sequential = season.run_sequential(factory, &quiet);

    assert!(concurrent.is_clean());
    assert_eq!(concurrent.standings, sequential.standings);
    assert_eq!(concurrent.outcomes, sequential.outcomes);

    let pit_stops: u32 = concurrent
        .finished()
        .flat_map(|r| r.classification.iter().map(|c| c.pit_stops))
        .sum();
    assert!(pit_stops > 0);
}

#[test]
fn races_never_touch_each_others_rosters() {
    let compounds = Compounds::standard().unwrap();
    // Race N fields N drivers named after the race
    let factory = |race_number: u32| -> Result<Vec<DriverState>, _> {
        (1..=race_number)
            .map(|i| {
                DriverState::new(
                    format!("R{race_number} Driver {i}"),
                    compounds.all(),
                    compounds.standard_strategy(),
                )
            })
            .collect()
    };
    let seen: Mutex<BTreeMap<u32, Vec<LapSnapshot>>> = Mutex::new(BTreeMap::new());
    let observer = |race_number: u32, s: &LapSnapshot| {
        seen.lock().unwrap().entry(race_number).or_default().push(s.clone());
    };
    let season = Season::new(3, 35, Some(7));

    let report = season.run(factory, &observer);

    let seen = seen.into_inner().unwrap();
    for race_number in 1..=3u32 {
        let snapshots = &seen[&race_number];
        assert_eq!(snapshots.len(), 35);
        for (lap, snapshot) in snapshots.iter().enumerate() {
            assert_eq!(snapshot.race_number, race_number);
            assert_eq!(snapshot.lap, lap as u32 + 1);
            assert_eq!(snapshot.rows.len(), race_number as usize);
            let prefix = format!("R{race_number} ");
            assert!(snapshot.rows.iter().all(|r| r.driver.starts_with(&prefix)));
        }

        // Every driver did the same three stops and the same laps as in a
        // race run alone
        let RaceOutcome::Finished(result) = &report.outcomes[&race_number] else {
            panic!("race {race_number} failed");
        };
        for driver in &result.classification {
            assert_eq!(driver.pit_stops, 3);
            assert_eq!(driver.lap_times.len(), 35);
        }
        let alone = season.run_sequential(
            |n| if n == race_number { factory(n) } else { Ok(Vec::new()) },
            &quiet,
        );
        assert_eq!(alone.outcomes[&race_number], report.outcomes[&race_number]);
    }
}

#[test]
fn default_season_runs_clean() {
    let config = SeasonConfig {
        num_races: 3,
        total_laps: 50,
        seed: Some(1),
        ..SeasonConfig::default()
    };

    let report = run_season(&config, &quiet).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.finished().count(), 3);
    // Ten drivers enter, seven make the grid
    assert_eq!(report.standings.len(), 7);
    assert!(report.standings.points_for("Driver 8").is_none());

    let table = report.standings.sorted();
    assert!(table.windows(2).all(|w| w[0].1 >= w[1].1));
    let total: u32 = table.iter().map(|(_, p)| p).sum();
    assert_eq!(total, 3 * 50 * 30);
}

#[test]
fn standard_compounds_and_roster_are_consistent() {
    let compounds = Compounds::standard().unwrap();
    let roster = default_roster(2, &compounds).unwrap();
    assert_eq!(roster[0].strategy, compounds.standard_strategy());
}
