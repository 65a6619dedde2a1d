// Policies mapping each inbound notice to at most one outbound action.

use super::tactics::{nearest_player_to, nearest_player_to_opponent};
use super::types::{
    Decision, Diagnostic, ErrorNotice, InboundMessage, MatchContext, MatchUpdate,
    OutboundMessage, UnknownMessage,
};
use crate::domain::match_state::ball_location;
use crate::domain::{ClientAction, Coordinate};
use tracing::{debug, error, info, warn};

// Fixed answers used when the snapshot cannot resolve a target.
const FALLBACK_RUNNER: u32 = 3;
const FALLBACK_RUN_TARGET: Coordinate = Coordinate::new(1, 1);
const FALLBACK_KICK_TARGET: Coordinate = Coordinate::new(10, 10);

/// Picks the answer to one inbound message.
///
/// Pure apart from tracing: the same message and context always produce the
/// same decision. Resolution failures never escape as errors; they yield the
/// policy's fallback action plus a diagnostic.
pub fn decide(message: &InboundMessage, ctx: &MatchContext<'_>) -> Decision {
    match message {
        InboundMessage::BallPossession(update) => possession_policy(update, ctx),
        InboundMessage::React(update) => react_policy(update, ctx),
        InboundMessage::ServerError(notice) => error_notice_policy(notice),
        InboundMessage::Unknown(unknown) => unknown_message_policy(unknown),
        InboundMessage::Registered { .. } => {
            debug!("registration acknowledgement needs no action");
            Decision::idle()
        }
    }
}

fn outbound(ctx: &MatchContext<'_>, action: ClientAction) -> OutboundMessage {
    OutboundMessage {
        token: ctx.token.to_string(),
        action,
    }
}

fn log_clock(update: &MatchUpdate) {
    if let Some(clock) = update.clock {
        debug!(remaining = clock.remaining, "match clock");
    }
}

/// Shoot at the rival goal.
fn possession_policy(update: &MatchUpdate, ctx: &MatchContext<'_>) -> Decision {
    log_clock(update);
    match update.goal_center(ctx.team_id, true) {
        Some(goal) => {
            info!(x = goal.x, y = goal.y, "kicking at goal");
            Decision::act(outbound(ctx, ClientAction::Kick(goal)))
        }
        None => {
            error!(recipient = %update.recipient, "goal not found; kicking to fallback target");
            Decision::fallback(
                outbound(ctx, ClientAction::Kick(FALLBACK_KICK_TARGET)),
                Diagnostic::MissingSnapshot,
            )
        }
    }
}

/// Mark whoever carries the ball, otherwise chase it.
fn react_policy(update: &MatchUpdate, ctx: &MatchContext<'_>) -> Decision {
    log_clock(update);
    let fallback_run = || outbound(ctx, ClientAction::run(FALLBACK_RUNNER, FALLBACK_RUN_TARGET));

    let Some(snapshot) = update.snapshot.as_ref() else {
        error!(recipient = %update.recipient, "ball not found; sending fallback run");
        return Decision::fallback(fallback_run(), Diagnostic::MissingSnapshot);
    };

    let ball = ball_location(snapshot);

    // The carrier is not checked against our own team: a teammate holding the
    // ball is "marked" like a rival whenever a rival wears the same number.
    if let Some(holder) = ball.holder {
        return match nearest_player_to_opponent(snapshot, ctx.team_id, holder) {
            Some(player) => {
                info!(player, opponent = holder, "marking ball carrier");
                Decision::act(outbound(
                    ctx,
                    ClientAction::MarkOpponent {
                        player,
                        opponent: holder,
                    },
                ))
            }
            None => {
                error!(holder, "ball carrier not found among rivals; sending fallback run");
                Decision::fallback(fallback_run(), Diagnostic::MarkTargetNotFound { holder })
            }
        };
    }

    match nearest_player_to(snapshot, ctx.team_id, ball.coordinate) {
        Some(player) => {
            info!(player, x = ball.coordinate.x, y = ball.coordinate.y, "chasing ball");
            Decision::act(outbound(ctx, ClientAction::run(player, ball.coordinate)))
        }
        None => {
            error!("no player to chase the ball; sending fallback run");
            Decision::fallback(fallback_run(), Diagnostic::NoOwnPlayers)
        }
    }
}

fn error_notice_policy(notice: &ErrorNotice) -> Decision {
    warn!(description = %notice.description, "server reported an error");
    Decision::report(Diagnostic::ServerError {
        description: notice.description.clone(),
    })
}

fn unknown_message_policy(unknown: &UnknownMessage) -> Decision {
    warn!(tag = ?unknown.tag, payload = %unknown.payload, "unhandled server message");
    Decision::report(Diagnostic::UnknownMessage {
        tag: unknown.tag.clone(),
        payload: unknown.payload.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClockTick, FieldSnapshot};
    use crate::use_cases::test_support::FieldBuilder;
    use serde_json::json;

    const TOKEN: &str = "TOKEN-3cdf275e";

    fn ctx(team_id: &str) -> MatchContext<'_> {
        MatchContext {
            team_id,
            token: TOKEN,
        }
    }

    fn update(snapshot: Option<FieldSnapshot>) -> MatchUpdate {
        MatchUpdate {
            recipient: TOKEN.to_string(),
            snapshot,
            clock: Some(ClockTick { remaining: 180_000 }),
        }
    }

    fn action(decision: &Decision) -> &ClientAction {
        &decision.action.as_ref().expect("expected an action").action
    }

    #[test]
    fn when_team1_has_the_ball_then_it_kicks_at_team2_goal_centre() {
        let field = FieldBuilder::new().carrier("T1", 11, 8, 9).build();
        let message = InboundMessage::BallPossession(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::Kick(Coordinate::new(6, 19)));
        assert_eq!(decision.diagnostic, None);
    }

    #[test]
    fn when_team2_has_the_ball_then_it_kicks_at_team1_goal_centre() {
        let field = FieldBuilder::new().carrier("T2", 11, 8, 9).build();
        let message = InboundMessage::BallPossession(update(Some(field)));

        let decision = decide(&message, &ctx("T2"));

        assert_eq!(action(&decision), &ClientAction::Kick(Coordinate::new(6, 0)));
    }

    #[test]
    fn when_possession_has_no_snapshot_then_fallback_kick_is_sent_with_diagnostic() {
        let message = InboundMessage::BallPossession(update(None));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::Kick(Coordinate::new(10, 10)));
        assert_eq!(decision.diagnostic, Some(Diagnostic::MissingSnapshot));
    }

    #[test]
    fn when_ball_is_free_then_nearest_player_runs_to_it() {
        let field = FieldBuilder::new()
            .player("T1", 11, 11, 10)
            .player("T1", 9, 8, 7)
            .player("T2", 5, 8, 8)
            .free_ball(8, 9)
            .build();
        let message = InboundMessage::React(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::run(9, Coordinate::new(8, 9)));
    }

    #[test]
    fn when_ball_is_in_the_air_then_nearest_player_runs_to_its_last_location() {
        let field = FieldBuilder::new()
            .player("T1", 4, 2, 2)
            .player("T1", 8, 6, 12)
            .ball_in_air(7, 13)
            .build();
        let message = InboundMessage::React(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::run(8, Coordinate::new(7, 13)));
        assert_eq!(decision.diagnostic, None);
    }

    #[test]
    fn when_rival_carries_the_ball_then_nearest_player_marks_it() {
        let field = FieldBuilder::new()
            .player("T1", 10, 4, 10)
            .player("T1", 7, 7, 10)
            .carrier("T2", 10, 7, 10)
            .build();
        let message = InboundMessage::React(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(
            action(&decision),
            &ClientAction::MarkOpponent {
                player: 7,
                opponent: 10
            }
        );
    }

    #[test]
    fn when_teammate_carries_the_ball_and_a_rival_shares_the_number_then_it_is_marked() {
        // The carrier's team is not checked: our own number 11 holds the ball,
        // and the policy marks the rival number 11 instead of supporting play.
        let field = FieldBuilder::new()
            .carrier("T1", 11, 8, 9)
            .player("T1", 6, 4, 12)
            .player("T2", 11, 4, 10)
            .build();
        let message = InboundMessage::React(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(
            action(&decision),
            &ClientAction::MarkOpponent {
                player: 6,
                opponent: 11
            }
        );
    }

    #[test]
    fn when_ball_carrier_cannot_be_found_among_rivals_then_fallback_run_is_sent() {
        let field = FieldBuilder::new()
            .carrier("T1", 11, 8, 9)
            .player("T1", 6, 4, 12)
            .build();
        let message = InboundMessage::React(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::run(3, Coordinate::new(1, 1)));
        assert_eq!(
            decision.diagnostic,
            Some(Diagnostic::MarkTargetNotFound { holder: 11 })
        );
    }

    #[test]
    fn when_react_has_no_snapshot_then_fallback_run_is_sent() {
        let message = InboundMessage::React(update(None));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::run(3, Coordinate::new(1, 1)));
        assert_eq!(decision.diagnostic, Some(Diagnostic::MissingSnapshot));
    }

    #[test]
    fn when_team_has_no_players_on_a_free_ball_then_fallback_run_is_sent() {
        let field = FieldBuilder::new().player("T2", 2, 3, 3).free_ball(4, 4).build();
        let message = InboundMessage::React(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(action(&decision), &ClientAction::run(3, Coordinate::new(1, 1)));
        assert_eq!(decision.diagnostic, Some(Diagnostic::NoOwnPlayers));
    }

    #[test]
    fn when_server_reports_an_error_then_no_action_and_description_is_recorded() {
        let message = InboundMessage::ServerError(ErrorNotice {
            description: "token invalido".to_string(),
            details: serde_json::Map::new(),
        });

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(decision.action, None);
        assert_eq!(
            decision.diagnostic,
            Some(Diagnostic::ServerError {
                description: "token invalido".to_string()
            })
        );
    }

    #[test]
    fn when_message_is_unknown_then_no_action_and_payload_is_recorded() {
        let payload = json!({"mensaje_id": "GOL", "datos": {}});
        let message = InboundMessage::Unknown(UnknownMessage {
            tag: Some("GOL".to_string()),
            payload: payload.clone(),
        });

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(decision.action, None);
        assert_eq!(
            decision.diagnostic,
            Some(Diagnostic::UnknownMessage {
                tag: Some("GOL".to_string()),
                payload
            })
        );
    }

    #[test]
    fn when_registration_is_acknowledged_then_nothing_is_sent() {
        let message = InboundMessage::Registered {
            token: TOKEN.to_string(),
            recipient: TOKEN.to_string(),
        };

        assert_eq!(decide(&message, &ctx("T1")), Decision::idle());
    }

    #[test]
    fn when_an_action_is_issued_then_it_carries_the_context_token_unchanged() {
        let field = FieldBuilder::new().carrier("T1", 11, 8, 9).build();
        let message = InboundMessage::BallPossession(update(Some(field)));

        let decision = decide(&message, &ctx("T1"));

        assert_eq!(decision.action.expect("kick").token, TOKEN);
    }

    #[test]
    fn when_the_same_message_is_decided_twice_then_decisions_are_equal() {
        let field = FieldBuilder::new()
            .player("T1", 7, 4, 5)
            .player("T1", 3, 6, 5)
            .free_ball(5, 5)
            .build();
        let message = InboundMessage::React(update(Some(field)));

        let first = decide(&message, &ctx("T1"));
        let second = decide(&message, &ctx("T1"));

        assert_eq!(first, second);
        assert_eq!(action(&first), &ClientAction::run(7, Coordinate::new(5, 5)));
    }
}
