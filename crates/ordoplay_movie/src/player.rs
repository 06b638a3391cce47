// SPDX-License-Identifier: MIT OR Apache-2.0
//! Movie player: position, looping and binding a clip to a scene.

use crate::binding::{Binding, BindingSet, ComponentId, ObjectId, SceneRef};
use crate::clip::Clip;
use crate::error::{MovieError, Result};
use crate::keyframe::KeyframeCurve;
use crate::playback::{apply_frame, ActionTracker, FrameReport};
use crate::scene::Scene;
use crate::settings::MovieSettings;
use crate::track::{Track, TrackId};
use crate::value::ValueType;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Plays a clip against a scene
#[derive(Debug, Clone)]
pub struct MoviePlayer {
    clip: Option<Clip>,
    bindings: BindingSet,
    actions: ActionTracker,
    position: f32,
    /// Playback state
    pub state: PlaybackState,
    /// Wrap to the start when reaching the end
    pub looping: bool,
    /// Playback speed multiplier
    pub time_scale: f32,
    /// Samples per second when compiling keyframes
    pub sample_rate: f32,
}

impl Default for MoviePlayer {
    fn default() -> Self {
        Self::from_settings(&MovieSettings::default())
    }
}

impl MoviePlayer {
    /// Create a player with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player configured by `settings`
    pub fn from_settings(settings: &MovieSettings) -> Self {
        Self {
            clip: None,
            bindings: BindingSet::new(),
            actions: ActionTracker::new(),
            position: 0.0,
            state: if settings.autoplay {
                PlaybackState::Playing
            } else {
                PlaybackState::Stopped
            },
            looping: settings.looping,
            time_scale: settings.time_scale,
            sample_rate: settings.sample_rate,
        }
    }

    /// Builder: play `clip`
    pub fn with_clip(mut self, clip: Clip) -> Self {
        self.set_clip(Some(clip));
        self
    }

    /// Clip being played
    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    /// Mutable clip being played
    pub fn clip_mut(&mut self) -> Option<&mut Clip> {
        self.clip.as_mut()
    }

    /// Swap the clip, returning the previous one. Bindings are kept, so
    /// tracks sharing ids with the old clip stay bound.
    pub fn set_clip(&mut self, clip: Option<Clip>) -> Option<Clip> {
        self.actions.reset();
        std::mem::replace(&mut self.clip, clip)
    }

    /// Track bindings
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// Mutable track bindings
    pub fn bindings_mut(&mut self) -> &mut BindingSet {
        &mut self.bindings
    }

    /// Current position in seconds
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Whether playback is advancing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Play from current position
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and rewind to the beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0.0;
        self.actions.reset();
    }

    /// Move to `position` and apply the clip there.
    ///
    /// Past the end, a looping player wraps around and any other player
    /// clamps to the end and stops. Negative positions delay the start, so
    /// nothing is applied until the position reaches zero.
    pub fn set_position(&mut self, position: f32, scene: &mut dyn Scene) -> Option<FrameReport> {
        self.position = position;

        let clip = self.clip.as_ref()?;
        let duration = clip.duration();

        if self.position >= duration {
            if self.looping && duration > 0.0 {
                self.position -= (self.position / duration).floor() * duration;
                self.actions.reset();
            } else {
                self.position = duration;
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Stopped;
                }
            }
        }

        if self.position < 0.0 {
            return None;
        }

        Some(apply_frame(
            clip,
            &mut self.bindings,
            scene,
            &mut self.actions,
            self.position,
        ))
    }

    /// Advance by `delta_time` scaled by the time scale, if playing
    pub fn update(&mut self, delta_time: f32, scene: &mut dyn Scene) -> Option<FrameReport> {
        if !self.is_playing() {
            return None;
        }
        self.set_position(self.position + delta_time * self.time_scale, scene)
    }

    /// Re-apply the clip at the current position
    pub fn apply(&mut self, scene: &mut dyn Scene) -> Option<FrameReport> {
        self.set_position(self.position, scene)
    }

    /// Compile `curve` onto a track at the player's sample rate
    pub fn write_keyframes(&mut self, track_id: TrackId, curve: KeyframeCurve) -> Result<()> {
        let sample_rate = self.sample_rate;
        self.clip
            .as_mut()
            .ok_or(MovieError::NoClip)?
            .write_keyframes(track_id, curve, sample_rate)?;
        Ok(())
    }

    /// Track bound directly to `object`
    pub fn track_for_object(&self, object: ObjectId) -> Option<TrackId> {
        self.track_for_scene_ref(|scene_ref| *scene_ref == SceneRef::Object(object))
    }

    /// Track bound directly to `component`
    pub fn track_for_component(&self, component: ComponentId) -> Option<TrackId> {
        self.track_for_scene_ref(
            |scene_ref| matches!(scene_ref, SceneRef::Component { id, .. } if *id == component),
        )
    }

    fn track_for_scene_ref(&self, matches: impl Fn(&SceneRef) -> bool) -> Option<TrackId> {
        let clip = self.clip.as_ref()?;
        clip.all_tracks()
            .find(|track| {
                self.bindings
                    .get_property(track)
                    .and_then(Binding::scene_ref)
                    .is_some_and(&matches)
            })
            .map(Track::id)
    }

    /// Child track of `parent` driving the member `name`
    pub fn member_track(&self, parent: TrackId, name: &str) -> Option<TrackId> {
        self.clip
            .as_ref()?
            .find_child(parent, name)
            .map(Track::id)
    }

    /// Track bound to `object`, creating a root track named after it if needed
    pub fn get_or_create_object_track(
        &mut self,
        object: ObjectId,
        scene: &dyn Scene,
    ) -> Result<TrackId> {
        if let Some(existing) = self.track_for_object(object) {
            return Ok(existing);
        }

        let name = scene
            .object_name(object)
            .ok_or(MovieError::ObjectNotFound(object))?;
        let clip = self.clip.as_mut().ok_or(MovieError::NoClip)?;
        let track_id = clip.add_track(name, ValueType::Object, None)?;

        self.bindings.bind_object(track_id, object);
        Ok(track_id)
    }

    /// Track bound to `component`, nested under its object's track
    pub fn get_or_create_component_track(
        &mut self,
        component: ComponentId,
        scene: &dyn Scene,
    ) -> Result<TrackId> {
        if let Some(existing) = self.track_for_component(component) {
            return Ok(existing);
        }

        let (owner, component_type) = scene
            .component_owner(component)
            .zip(scene.component_type(component))
            .ok_or(MovieError::ComponentNotFound(component))?;

        let parent = self.get_or_create_object_track(owner, scene)?;
        let clip = self.clip.as_mut().ok_or(MovieError::NoClip)?;
        let track_id = clip.add_track(
            component_type.clone(),
            ValueType::Component(component_type.clone()),
            Some(parent),
        )?;

        self.bindings
            .bind_component(track_id, component, component_type);
        Ok(track_id)
    }

    /// Track driving member `name` of whatever `parent` is bound to
    pub fn get_or_create_member_track(
        &mut self,
        parent: TrackId,
        name: &str,
        scene: &dyn Scene,
    ) -> Result<TrackId> {
        if let Some(existing) = self.member_track(parent, name) {
            return Ok(existing);
        }

        let clip = self.clip.as_mut().ok_or(MovieError::NoClip)?;
        let parent_track = clip.track(parent).ok_or(MovieError::TrackNotFound(parent))?;
        let parent_binding = self
            .bindings
            .get_property(parent_track)
            .cloned()
            .ok_or(MovieError::UnresolvedBinding(parent))?;

        let binding = Binding::member(parent_binding, name, scene)
            .ok_or_else(|| MovieError::MemberNotFound(name.to_string()))?;
        let track_id = clip.add_track(name, binding.value_type(), Some(parent))?;

        self.bindings.bind(track_id, binding);
        Ok(track_id)
    }
}
