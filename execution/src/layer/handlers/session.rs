use super::*;
use commonware_cryptography::ed25519::Signature;
use reflex_types::execution::ScorePermit;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_start_game(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        let mut economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }

        let mut player = self.get_or_init_player(public).await?;
        if !player.verification.is_verified
            || !player.verification.level.meets(VerificationLevel::Document)
        {
            return Ok(economy_error_vec(
                public,
                ERROR_VERIFICATION_REQUIRED,
                "Document verification or higher required",
            ));
        }
        if player.active_session.is_some() {
            return Ok(economy_error_vec(
                public,
                ERROR_SESSION_ACTIVE,
                "A session is already active",
            ));
        }

        let now = self.now_secs();
        let free_per_day = economy.pricing.free_turns_per_day;
        if player.quota.consume(now, free_per_day).is_err() {
            return Ok(economy_error_vec(
                public,
                ERROR_NO_TURNS,
                "No turns available",
            ));
        }

        let game_id = economy.next_game_id();
        player.active_session = Some(game_id);

        let availability = player.quota.available(now, free_per_day);
        let (unlimited, turns_remaining) = match availability {
            TurnAvailability::Unlimited => (true, 0),
            TurnAvailability::Count(count) => (false, count),
        };

        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Economy, Value::Economy(economy));

        Ok(vec![Event::GameStarted {
            player: public.clone(),
            game_id,
            unlimited,
            turns_remaining,
        }])
    }

    pub(in crate::layer) async fn handle_submit_score(
        &mut self,
        public: &PublicKey,
        score: u64,
        round: u32,
        mode: GameMode,
    ) -> anyhow::Result<Vec<Event>> {
        let economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }
        if score == 0 {
            return Ok(economy_error_vec(
                public,
                ERROR_INVALID_SCORE,
                "Score must be positive",
            ));
        }
        if round == 0 {
            return Ok(economy_error_vec(
                public,
                ERROR_INVALID_ROUND,
                "Round must be positive",
            ));
        }

        let player = self.get_or_init_player(public).await?;
        let Some(game_id) = player.active_session else {
            return Ok(economy_error_vec(
                public,
                ERROR_NO_ACTIVE_SESSION,
                "No active session",
            ));
        };

        self.settle_score(public, player, &economy, game_id, score, round, mode)
            .await
    }

    pub(in crate::layer) async fn handle_submit_score_with_permit(
        &mut self,
        public: &PublicKey,
        permit: &ScorePermit,
        signature: &Signature,
    ) -> anyhow::Result<Vec<Event>> {
        let economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }
        if !economy.is_authorized_submitter(public) && !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Not an authorized submitter",
            ));
        }
        if permit.score == 0 {
            return Ok(economy_error_vec(
                &permit.player,
                ERROR_INVALID_SCORE,
                "Score must be positive",
            ));
        }
        if permit.round == 0 {
            return Ok(economy_error_vec(
                &permit.player,
                ERROR_INVALID_ROUND,
                "Round must be positive",
            ));
        }
        if self.now_secs() > permit.deadline {
            return Ok(economy_error_vec(
                &permit.player,
                ERROR_PERMIT_EXPIRED,
                "Permit deadline passed",
            ));
        }
        if !permit.verify(signature) {
            return Ok(economy_error_vec(
                &permit.player,
                ERROR_PERMIT_INVALID,
                "Permit signature invalid",
            ));
        }

        let nonce_key = Key::PermitNonce(permit.player.clone(), permit.nonce);
        if self.get(&nonce_key).await?.is_some() {
            return Ok(economy_error_vec(
                &permit.player,
                ERROR_PERMIT_USED,
                "Permit nonce already consumed",
            ));
        }

        let player = self.get_or_init_player(&permit.player).await?;
        match player.active_session {
            None => {
                return Ok(economy_error_vec(
                    &permit.player,
                    ERROR_NO_ACTIVE_SESSION,
                    "No active session",
                ));
            }
            Some(game_id) if game_id != permit.session_id => {
                return Ok(economy_error_vec(
                    &permit.player,
                    ERROR_PERMIT_INVALID,
                    "Permit session does not match active session",
                ));
            }
            Some(_) => {}
        }

        let target = permit.player.clone();
        let events = self
            .settle_score(
                &target,
                player,
                &economy,
                permit.session_id,
                permit.score,
                permit.round,
                permit.mode,
            )
            .await?;

        // Consume the nonce only once settlement has gone through; a rejected
        // settlement stages nothing, so the permit stays usable. Consumed
        // nonces are permanent, never pruned.
        if events
            .iter()
            .any(|event| matches!(event, Event::ScoreSubmitted { .. }))
        {
            self.insert(nonce_key, Value::PermitUsed);
        }

        Ok(events)
    }

    /// Shared settlement path for direct and permit submissions: mint the
    /// reward, update lifetime stats and the mode leaderboard, close the
    /// session. All checks run before the first staged write.
    #[allow(clippy::too_many_arguments)]
    async fn settle_score(
        &mut self,
        public: &PublicKey,
        mut player: Player,
        economy: &EconomyState,
        game_id: u64,
        score: u64,
        round: u32,
        mode: GameMode,
    ) -> anyhow::Result<Vec<Event>> {
        let multiplier = economy.multipliers.multiplier_for(player.verification.level);
        let Some(reward) = economy.pricing.reward_for(score, multiplier) else {
            return Ok(economy_error_vec(
                public,
                ERROR_SUPPLY_EXCEEDED,
                "Reward exceeds representable supply",
            ));
        };

        let mut ledger = self.get_or_init_ledger().await?;
        if ledger.mint(&mut player.balance, reward).is_err() {
            return Ok(economy_error_vec(
                public,
                ERROR_SUPPLY_EXCEEDED,
                "Mint would exceed max supply",
            ));
        }

        let new_high = player.stats.record_game(mode, score);
        player.active_session = None;

        let mut events = vec![Event::ScoreSubmitted {
            player: public.clone(),
            mode,
            score,
            round,
            game_id,
            reward,
            new_balance: player.balance,
        }];
        if new_high {
            events.push(Event::HighScoreUpdated {
                player: public.clone(),
                mode,
                score,
            });
        }

        let mut board = self.get_or_init_leaderboard(mode).await?;
        let placement = board.record(LeaderboardEntry {
            player: public.clone(),
            score,
            timestamp: self.now_secs(),
            round,
            game_mode: mode,
            game_id,
        });
        if let ScorePlacement::Inserted { rank } | ScorePlacement::Improved { rank } = placement {
            events.push(Event::LeaderboardUpdated {
                mode,
                player: public.clone(),
                rank: rank.saturating_add(1) as u32,
                score,
            });
            self.insert(Key::Leaderboard(mode), Value::Leaderboard(board));
        }

        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Ledger, Value::Ledger(ledger));

        Ok(events)
    }
}
