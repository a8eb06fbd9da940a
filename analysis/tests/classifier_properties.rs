use analysis::*;
use engine::Player;
use model::{CubeEquitySet, CubeInfo, CubeOwner, TableMatchEquity};
use proptest::prelude::*;

fn money() -> CubeInfo {
    CubeInfo {
        jacoby: false,
        beavers: false,
        ..CubeInfo::money(Player::Zero)
    }
}

fn severity(skill: SkillType) -> u8 {
    match skill {
        SkillType::None => 0,
        SkillType::Doubtful => 1,
        SkillType::Bad => 2,
        SkillType::VeryBad => 3,
    }
}

/// Money and match play, with any cube owner and the money rule options.
fn cube_info_strategy() -> impl Strategy<Value = CubeInfo> {
    let owner = prop_oneof![
        Just(CubeOwner::Centered),
        Just(CubeOwner::Player(Player::Zero)),
        Just(CubeOwner::Player(Player::One)),
    ];
    let money = (any::<bool>(), any::<bool>()).prop_map(|(jacoby, beavers)| CubeInfo {
        jacoby,
        beavers,
        ..CubeInfo::money(Player::Zero)
    });
    let match_play = (1..=7u32, 0..7u32, 0..7u32, any::<bool>(), any::<bool>()).prop_map(
        |(match_to, a, b, crawford, post_crawford)| CubeInfo {
            crawford: crawford && !post_crawford,
            post_crawford,
            ..CubeInfo::match_play(match_to, [a % match_to, b % match_to], Player::Zero)
        },
    );

    (prop_oneof![money, match_play], owner, 0..3u32).prop_map(|(ci, owner, log_cube)| {
        let cube = if owner == CubeOwner::Centered {
            1
        } else {
            1 << log_cube
        };
        CubeInfo { owner, cube, ..ci }
    })
}

fn comparison_strategy() -> impl Strategy<Value = ThresholdComparison> {
    prop_oneof![Just(ThresholdComparison::Strict), Just(ThresholdComparison::Inclusive)]
}

proptest! {
    #[test]
    fn larger_loss_is_never_better(
        a in 0.0..1.0f64,
        b in 0.0..1.0f64,
        cmp in comparison_strategy(),
    ) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        let thresholds = SkillThresholds::default();

        let small_skill = classify_skill(small, &thresholds, cmp);
        let large_skill = classify_skill(large, &thresholds, cmp);
        prop_assert!(severity(large_skill) >= severity(small_skill));
    }

    #[test]
    fn skill_ignores_sign(loss in -1.0..1.0f64) {
        let thresholds = SkillThresholds::default();
        prop_assert_eq!(
            classify_skill(loss, &thresholds, ThresholdComparison::Strict),
            classify_skill(-loss, &thresholds, ThresholdComparison::Strict)
        );
    }

    #[test]
    fn luck_is_symmetric_with_symmetric_thresholds(luck in -1.5..1.5f64) {
        let thresholds = LuckThresholds::default();
        let lucky = classify_luck(luck, &thresholds, ThresholdComparison::Strict);
        let unlucky = classify_luck(-luck, &thresholds, ThresholdComparison::Strict);

        prop_assert_eq!(lucky.magnitude(), unlucky.magnitude());
        if lucky != LuckType::None {
            prop_assert_ne!(lucky, unlucky);
        }
    }

    #[test]
    fn luck_magnitude_grows(a in 0.0..1.5f64, b in 0.0..1.5f64) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        let thresholds = LuckThresholds::default();

        for sign in [1.0, -1.0] {
            let small_luck = classify_luck(sign * small, &thresholds, ThresholdComparison::Strict);
            let large_luck = classify_luck(sign * large, &thresholds, ThresholdComparison::Strict);
            prop_assert!(large_luck.magnitude() >= small_luck.magnitude());
        }
    }

    #[test]
    fn classify_is_deterministic(nd in -2.0..3.0f64, dt in -4.0..6.0f64, gammons in 0.0..0.5f64) {
        let met = TableMatchEquity::generated(1, 0.0).unwrap();
        let ctx = AnalysisContext::new(AnalysisOptions::default(), &met);
        let set = CubeEquitySet::new(nd, dt, 1.0).with_gammons(gammons);

        prop_assert_eq!(classify(&set, &money(), &ctx), classify(&set, &money(), &ctx));
    }

    #[test]
    fn recommended_action_costs_nothing(
        nd in -2.0..3.0f64,
        dt in -4.0..6.0f64,
        dp in 0.5..1.5f64,
        beaver in prop::option::of(-4.0..2.0f64),
        gammons in 0.0..0.5f64,
        ci in cube_info_strategy(),
    ) {
        let met = TableMatchEquity::generated(7, 0.2).unwrap();
        let ctx = AnalysisContext::new(AnalysisOptions::default(), &met);
        let mut set = CubeEquitySet::new(nd, dt, dp).with_gammons(gammons);
        if let Some(beaver) = beaver {
            set = set.with_beaver(beaver);
        }
        let verdict = *classify(&set, &ci, &ctx).verdict().unwrap();

        let action = if verdict.decision.should_double() {
            CubeAction::Double
        } else {
            CubeAction::NoDouble
        };
        prop_assert_eq!(action_cost(&set, &ci, &ctx, action), 0.0);

        if let Some(response) = verdict.decision.proper_response() {
            prop_assert_eq!(action_cost(&set, &ci, &ctx, response), 0.0);
        }
    }

    #[test]
    fn costs_are_never_negative(nd in -2.0..3.0f64, dt in -4.0..6.0f64, dp in 0.5..1.5f64) {
        let met = TableMatchEquity::generated(1, 0.0).unwrap();
        let ctx = AnalysisContext::new(AnalysisOptions::default(), &met);
        let set = CubeEquitySet::new(nd, dt, dp);

        let actions = [
            CubeAction::NoDouble,
            CubeAction::Double,
            CubeAction::Take,
            CubeAction::Pass,
        ];
        for action in actions {
            prop_assert!(action_cost(&set, &money(), &ctx, action) >= 0.0);
        }
    }
}
