//! # Score Model Scenarios
//!
//! Reference graph checks against the plaintext model, and agreement between
//! the model, the renderer and the CLI report.

#[cfg(test)]
mod tests {
    use ivs_01_score_model::{
        compute_scores, ContactGraph, InfectionSet, ScaledScore, ScoreParams, SelfScorePolicy,
    };
    use ivs_02_decryption::{render, RiskTier};
    use ivs_runtime::report;
    use ivs_runtime::{REFERENCE_CONTACTS, REFERENCE_INFECTED};
    use shared_types::entities::{DataKind, UserId};

    fn reference_graph() -> ContactGraph {
        ContactGraph::from_edges(
            REFERENCE_CONTACTS
                .iter()
                .map(|&(a, b)| (UserId(a), UserId(b))),
        )
        .unwrap()
    }

    fn reference_infected() -> InfectionSet {
        REFERENCE_INFECTED.iter().copied().map(UserId).collect()
    }

    fn raw(score: Option<ScaledScore>) -> Option<u32> {
        score.map(ScaledScore::raw)
    }

    #[test]
    fn test_reference_scenario_with_dmax_two() {
        let sheet = compute_scores(
            &reference_graph(),
            &reference_infected(),
            ScoreParams::new(2, SelfScorePolicy::Zero),
        )
        .unwrap();

        assert_eq!(raw(sheet.get(UserId(2))), Some(5000));
        assert_eq!(raw(sheet.get(UserId(3))), Some(5000));
        assert_eq!(raw(sheet.get(UserId(4))), Some(2500));
        assert_eq!(raw(sheet.get(UserId(5))), Some(2500));
    }

    #[test]
    fn test_non_infected_scores_do_not_depend_on_self_policy() {
        let graph = reference_graph();
        let infected = reference_infected();
        let policies = [
            SelfScorePolicy::Zero,
            SelfScorePolicy::Excluded,
            SelfScorePolicy::Fixed(ScaledScore::ONE),
        ];

        let sheets: Vec<_> = policies
            .iter()
            .map(|policy| compute_scores(&graph, &infected, ScoreParams::new(2, *policy)).unwrap())
            .collect();

        for user in 2..=5 {
            let user = UserId(user);
            let first = sheets[0].get(user);
            assert!(sheets.iter().all(|sheet| sheet.get(user) == first));
        }
    }

    #[test]
    fn test_dmax_cuts_off_distant_users() {
        let sheet = compute_scores(
            &reference_graph(),
            &reference_infected(),
            ScoreParams::new(1, SelfScorePolicy::Zero),
        )
        .unwrap();

        assert_eq!(raw(sheet.get(UserId(2))), Some(5000));
        assert_eq!(raw(sheet.get(UserId(4))), Some(0));
        assert_eq!(raw(sheet.get(UserId(5))), Some(0));
    }

    #[test]
    fn test_closest_source_wins() {
        let infected: InfectionSet = [UserId(1), UserId(4)].into_iter().collect();
        let sheet = compute_scores(
            &reference_graph(),
            &infected,
            ScoreParams::new(2, SelfScorePolicy::Zero),
        )
        .unwrap();

        // User 2 touches both sources; user 5 is two hops from user 1 only
        assert_eq!(raw(sheet.get(UserId(2))), Some(5000));
        assert_eq!(raw(sheet.get(UserId(5))), Some(2500));
        // Infected users still see each other
        assert_eq!(raw(sheet.get(UserId(1))), Some(2500));
        assert_eq!(raw(sheet.get(UserId(4))), Some(2500));
    }

    #[test]
    fn test_every_model_value_renders() {
        let sheet = compute_scores(
            &reference_graph(),
            &reference_infected(),
            ScoreParams::new(2, SelfScorePolicy::Zero),
        )
        .unwrap();

        for (user, score) in sheet.iter() {
            let rendered = render(u64::from(score.raw()), DataKind::Score)
                .unwrap_or_else(|err| panic!("user {user}: {err}"));
            let expected = match user.get() {
                2 | 3 => RiskTier::High,
                4 | 5 => RiskTier::Medium,
                _ => RiskTier::Minimal,
            };
            assert_eq!(rendered.tier(), Some(expected), "user {user}");
        }
    }

    #[test]
    fn test_score_report_lists_every_user() {
        let sheet = compute_scores(
            &reference_graph(),
            &reference_infected(),
            ScoreParams::new(2, SelfScorePolicy::Zero),
        )
        .unwrap();

        let text = report::score_sheet(&sheet);
        assert!(text.starts_with("IVS scores (d_max = 2"));
        assert_eq!(text.lines().count(), 2 + 5);
        assert!(text.contains("0.2500"));
    }
}
