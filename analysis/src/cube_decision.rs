use std::fmt;

use log::debug;
use model::{CubeEquitySet, CubeInfo, CubeOwner};
use serde::{Deserialize, Serialize};

use super::context::AnalysisContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CubeAction {
    NoDouble,
    Double,
    Take,
    Pass,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CubeDecision {
    DoubleTake,
    DoublePass,
    NoDoubleTake,
    TooGoodTake,
    TooGoodPass,
    DoubleBeaver,
    NoDoubleBeaver,
    RedoubleTake,
    RedoublePass,
    NoRedoubleTake,
    TooGoodRedoubleTake,
    TooGoodRedoublePass,
    NoRedoubleBeaver,
    NoDoubleDeadCube,
    NoRedoubleDeadCube,
    OptionalDoubleBeaver,
    OptionalDoubleTake,
    OptionalRedoubleTake,
    OptionalDoublePass,
    OptionalRedoublePass,
    NotAvailable,
}

impl CubeDecision {
    pub fn recommendation(&self) -> &'static str {
        match self {
            CubeDecision::DoubleTake => "Double, take",
            CubeDecision::DoublePass => "Double, pass",
            CubeDecision::NoDoubleTake => "No double, take",
            CubeDecision::TooGoodTake => "Too good to double, take",
            CubeDecision::TooGoodPass => "Too good to double, pass",
            CubeDecision::DoubleBeaver => "Double, beaver",
            CubeDecision::NoDoubleBeaver => "No double, beaver",
            CubeDecision::RedoubleTake => "Redouble, take",
            CubeDecision::RedoublePass => "Redouble, pass",
            CubeDecision::NoRedoubleTake => "No redouble, take",
            CubeDecision::TooGoodRedoubleTake => "Too good to redouble, take",
            CubeDecision::TooGoodRedoublePass => "Too good to redouble, pass",
            CubeDecision::NoRedoubleBeaver => "No redouble, beaver",
            CubeDecision::NoDoubleDeadCube => "Never double, take (dead cube)",
            CubeDecision::NoRedoubleDeadCube => "Never redouble, take (dead cube)",
            CubeDecision::OptionalDoubleBeaver => "Optional double, beaver",
            CubeDecision::OptionalDoubleTake => "Optional double, take",
            CubeDecision::OptionalRedoubleTake => "Optional redouble, take",
            CubeDecision::OptionalDoublePass => "Optional double, pass",
            CubeDecision::OptionalRedoublePass => "Optional redouble, pass",
            CubeDecision::NotAvailable => "Cube not available",
        }
    }

    /// Whether the player on roll should turn the cube. Optional doubles count as doubles.
    pub fn should_double(&self) -> bool {
        matches!(
            self,
            CubeDecision::DoubleTake
                | CubeDecision::DoublePass
                | CubeDecision::DoubleBeaver
                | CubeDecision::RedoubleTake
                | CubeDecision::RedoublePass
                | CubeDecision::OptionalDoubleBeaver
                | CubeDecision::OptionalDoubleTake
                | CubeDecision::OptionalRedoubleTake
                | CubeDecision::OptionalDoublePass
                | CubeDecision::OptionalRedoublePass
        )
    }

    /// The correct answer to a double. Beavers are takes.
    pub fn proper_response(&self) -> Option<CubeAction> {
        match self {
            CubeDecision::DoublePass
            | CubeDecision::TooGoodPass
            | CubeDecision::RedoublePass
            | CubeDecision::TooGoodRedoublePass
            | CubeDecision::OptionalDoublePass
            | CubeDecision::OptionalRedoublePass => Some(CubeAction::Pass),
            CubeDecision::NoDoubleDeadCube
            | CubeDecision::NoRedoubleDeadCube
            | CubeDecision::NotAvailable => None,
            _ => Some(CubeAction::Take),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            CubeDecision::OptionalDoubleBeaver
                | CubeDecision::OptionalDoubleTake
                | CubeDecision::OptionalRedoubleTake
                | CubeDecision::OptionalDoublePass
                | CubeDecision::OptionalRedoublePass
        )
    }

    pub fn is_too_good(&self) -> bool {
        matches!(
            self,
            CubeDecision::TooGoodTake
                | CubeDecision::TooGoodPass
                | CubeDecision::TooGoodRedoubleTake
                | CubeDecision::TooGoodRedoublePass
        )
    }
}

impl fmt::Display for CubeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.recommendation())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeVerdict {
    pub decision: CubeDecision,
    /// Equity of the best line for the player on roll.
    pub optimal: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CubeClassification {
    Classified(CubeVerdict),
    /// The equities have not been evaluated.
    NotClassifiable,
}

impl CubeClassification {
    pub fn verdict(&self) -> Option<&CubeVerdict> {
        match self {
            CubeClassification::Classified(verdict) => Some(verdict),
            CubeClassification::NotClassifiable => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CubeErrorKind {
    MissedDoubleBelowCash,
    MissedDoubleAboveCash,
    WrongDoubleBelowCash,
    WrongDoubleAboveCash,
    WrongTake,
    WrongPass,
}

impl CubeErrorKind {
    pub const ALL: [CubeErrorKind; 6] = [
        CubeErrorKind::MissedDoubleBelowCash,
        CubeErrorKind::MissedDoubleAboveCash,
        CubeErrorKind::WrongDoubleBelowCash,
        CubeErrorKind::WrongDoubleAboveCash,
        CubeErrorKind::WrongTake,
        CubeErrorKind::WrongPass,
    ];

    pub fn index(&self) -> usize {
        match self {
            CubeErrorKind::MissedDoubleBelowCash => 0,
            CubeErrorKind::MissedDoubleAboveCash => 1,
            CubeErrorKind::WrongDoubleBelowCash => 2,
            CubeErrorKind::WrongDoubleAboveCash => 3,
            CubeErrorKind::WrongTake => 4,
            CubeErrorKind::WrongPass => 5,
        }
    }
}

/// A cube action that lost equity, with its cost in normalised equity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeError {
    pub kind: CubeErrorKind,
    pub cost: f64,
}

fn redouble<T>(cube_info: &CubeInfo, initial: T, redouble: T) -> T {
    if cube_info.owner == CubeOwner::Centered {
        initial
    } else {
        redouble
    }
}

/// Picks the correct cube action for the player on roll.
pub fn classify(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
) -> CubeClassification {
    use CubeDecision::*;

    if !equities.is_evaluated() {
        debug!("Cube decision is not classifiable: equities not evaluated");
        return CubeClassification::NotClassifiable;
    }

    let ci = cube_info;
    let nd = equities.no_double;
    let dt = equities.double_take;
    let dp = equities.double_pass;
    let gammons = equities.win_gammon > 0.0;
    let beaver_region = ci.is_money() && ci.beavers && (-2.0..=0.0).contains(&dt);
    let verdict =
        |decision, optimal| CubeClassification::Classified(CubeVerdict { decision, optimal });

    if !ci.cube_available() {
        let decision = if !ci.is_money() && ci.owner != CubeOwner::Player(ci.on_roll.opponent()) {
            redouble(ci, NoDoubleDeadCube, NoRedoubleDeadCube)
        } else {
            NotAvailable
        };
        return verdict(decision, nd);
    }

    if dt >= nd && dp >= nd {
        if dp > dt {
            let optional = ctx.is_equal(dt, nd);
            let beaver = equities.double_beaver.unwrap_or(2.0 * dt);

            let decision = if beaver_region {
                if beaver < nd {
                    NoDoubleBeaver
                } else if optional {
                    OptionalDoubleBeaver
                } else {
                    DoubleBeaver
                }
            } else if optional {
                redouble(ci, OptionalDoubleTake, OptionalRedoubleTake)
            } else {
                redouble(ci, DoubleTake, RedoubleTake)
            };

            let optimal = if decision == NoDoubleBeaver { nd } else { dt };
            return verdict(decision, optimal);
        }

        let gammons_live = !ci.is_money() || !ci.is_centered() || !ci.jacoby;
        let optional = ctx.is_equal(nd, dp) && gammons && gammons_live;
        let decision = if optional {
            redouble(ci, OptionalDoublePass, OptionalRedoublePass)
        } else {
            redouble(ci, DoublePass, RedoublePass)
        };
        return verdict(decision, dp);
    }

    // Playing on cannot beat cashing without gammons, so a no-double edge over the pass is noise.
    let too_good_pass = || {
        if gammons {
            verdict(redouble(ci, TooGoodPass, TooGoodRedoublePass), nd)
        } else {
            verdict(redouble(ci, DoublePass, RedoublePass), dp)
        }
    };

    if nd > dt {
        if dt > dp {
            too_good_pass()
        } else if nd > dp {
            if gammons {
                verdict(redouble(ci, TooGoodTake, TooGoodRedoubleTake), nd)
            } else {
                verdict(redouble(ci, NoDoubleTake, NoRedoubleTake), nd)
            }
        } else if beaver_region {
            verdict(redouble(ci, NoDoubleBeaver, NoRedoubleBeaver), nd)
        } else {
            verdict(redouble(ci, NoDoubleTake, NoRedoubleTake), nd)
        }
    } else {
        too_good_pass()
    }
}

/// Doubling costs less than the close-cube threshold against the optimal action.
pub fn is_close(equities: &CubeEquitySet, cube_info: &CubeInfo, ctx: &AnalysisContext) -> bool {
    match classify(equities, cube_info, ctx) {
        CubeClassification::Classified(verdict) => is_close_verdict(equities, &verdict, ctx),
        CubeClassification::NotClassifiable => false,
    }
}

pub(crate) fn is_close_verdict(
    equities: &CubeEquitySet,
    verdict: &CubeVerdict,
    ctx: &AnalysisContext,
) -> bool {
    verdict.optimal - equities.response() < ctx.options.close_cube
}

/// The equity cost of `action` against the correct cube play, or `None` when the action was correct
/// or the equities cannot be classified. Costs within the equity epsilon count as correct.
pub fn cube_error(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> Option<CubeError> {
    let verdict = *classify(equities, cube_info, ctx).verdict()?;
    cube_error_for(equities, &verdict, ctx, action)
}

pub(crate) fn cube_error_for(
    equities: &CubeEquitySet,
    verdict: &CubeVerdict,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> Option<CubeError> {
    let e = equities;
    let (kind, cost) = match action {
        CubeAction::NoDouble => {
            if verdict.decision == CubeDecision::NotAvailable {
                return None;
            }
            let kind = if e.double_take > e.double_pass {
                CubeErrorKind::MissedDoubleAboveCash
            } else {
                CubeErrorKind::MissedDoubleBelowCash
            };
            (kind, verdict.optimal - e.no_double)
        }
        CubeAction::Double => {
            let kind = if e.no_double > e.double_pass {
                CubeErrorKind::WrongDoubleAboveCash
            } else {
                CubeErrorKind::WrongDoubleBelowCash
            };
            (kind, verdict.optimal - e.response())
        }
        CubeAction::Take => (CubeErrorKind::WrongTake, e.double_take - e.double_pass),
        CubeAction::Pass => (CubeErrorKind::WrongPass, e.double_pass - e.double_take),
    };

    (cost > ctx.options.equity_epsilon).then_some(CubeError { kind, cost })
}

/// The cost of `action`, zero when it was correct.
pub fn action_cost(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> f64 {
    cube_error(equities, cube_info, ctx, action).map_or(0.0, |e| e.cost)
}

pub fn is_missed_double(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> bool {
    matches!(
        cube_error(equities, cube_info, ctx, action).map(|e| e.kind),
        Some(CubeErrorKind::MissedDoubleBelowCash | CubeErrorKind::MissedDoubleAboveCash)
    )
}

pub fn is_wrong_double(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> bool {
    matches!(
        cube_error(equities, cube_info, ctx, action).map(|e| e.kind),
        Some(CubeErrorKind::WrongDoubleBelowCash | CubeErrorKind::WrongDoubleAboveCash)
    )
}

pub fn is_wrong_take(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> bool {
    matches!(
        cube_error(equities, cube_info, ctx, action).map(|e| e.kind),
        Some(CubeErrorKind::WrongTake)
    )
}

pub fn is_wrong_pass(
    equities: &CubeEquitySet,
    cube_info: &CubeInfo,
    ctx: &AnalysisContext,
    action: CubeAction,
) -> bool {
    matches!(
        cube_error(equities, cube_info, ctx, action).map(|e| e.kind),
        Some(CubeErrorKind::WrongPass)
    )
}

/// Where the no-double equity sits between take and pass, for decisions where doubling is wrong.
/// For "no double" this is the fraction of doubles that would have to be passed before doubling is
/// right; for "too good, pass" the fraction that would have to be taken.
pub fn get_percent(equities: &CubeEquitySet, decision: CubeDecision) -> Option<f64> {
    let e = equities;

    match decision {
        CubeDecision::NoDoubleTake
        | CubeDecision::NoDoubleBeaver
        | CubeDecision::NoRedoubleTake
        | CubeDecision::NoRedoubleBeaver => {
            Some((e.no_double - e.double_take) / (e.double_pass - e.double_take))
        }
        CubeDecision::TooGoodPass | CubeDecision::TooGoodRedoublePass
            if e.no_double <= e.double_take =>
        {
            Some((e.no_double - e.double_pass) / (e.double_take - e.double_pass))
        }
        _ => None,
    }
}
