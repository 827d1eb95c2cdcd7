use super::*;

fn image(path: &str, secs: f64, width: u32, height: u32) -> FfmpegClip {
    FfmpegClip::source(
        MediaKind::Image,
        PathBuf::from(path),
        Some(secs),
        Some(secs),
        false,
        Some(Canvas { width, height }),
    )
}

fn video(path: &str, secs: f64, has_audio: bool) -> FfmpegClip {
    FfmpegClip::source(
        MediaKind::Video,
        PathBuf::from(path),
        None,
        Some(secs),
        has_audio,
        Some(Canvas {
            width: 640,
            height: 360,
        }),
    )
}

fn audio(path: &str, secs: f64) -> FfmpegClip {
    FfmpegClip::source(
        MediaKind::Audio,
        PathBuf::from(path),
        None,
        Some(secs),
        true,
        None,
    )
}

#[test]
fn image_resize_lowers_to_scale() {
    let clip = image("/in/title.png", 5.0, 1280, 720)
        .scale(Some(200), Some(100))
        .unwrap();
    assert_eq!(
        clip.size(),
        Some(Canvas {
            width: 200,
            height: 100
        })
    );

    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(
        graph.inputs,
        vec![GraphInput {
            pre_args: vec!["-loop".into(), "1".into(), "-t".into(), "5".into()],
            path: PathBuf::from("/in/title.png"),
        }]
    );
    assert_eq!(
        graph.filter_complex(),
        "[0:v:0]scale=200:100[v0];[v0]null[vout]"
    );
    assert_eq!(graph.video.as_deref(), Some("vout"));
    assert_eq!(graph.audio, None);
}

#[test]
fn resize_with_one_dimension_keeps_aspect() {
    let clip = image("/in/a.png", 1.0, 1280, 720)
        .scale(Some(640), None)
        .unwrap();
    assert_eq!(
        clip.size(),
        Some(Canvas {
            width: 640,
            height: 360
        })
    );
    let graph = FilterGraph::lower(&clip).unwrap();
    assert!(graph.filter_complex().starts_with("[0:v:0]scale=640:-2[v0]"));
}

#[test]
fn margin_lowers_to_pad() {
    let clip = image("/in/a.png", 1.0, 100, 50)
        .pad(10, Rgb8 { r: 255, g: 0, b: 0 }, 1)
        .unwrap();
    assert_eq!(
        clip.size(),
        Some(Canvas {
            width: 120,
            height: 70
        })
    );
    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(
        graph.chains[0],
        "[0:v:0]pad=w=iw+20:h=ih+20:x=10:y=10:color=0xFF0000@1[v0]"
    );
}

#[test]
fn concat_fills_missing_audio_with_silence() {
    let talk = video("/in/talk.mp4", 4.0, true);
    let card = image("/in/card.png", 2.0, 640, 360);
    let clip = FfmpegClip::concat(&[talk, card]).unwrap();
    assert_eq!(clip.duration(), Some(6.0));
    assert!(clip.has_audio());

    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(graph.inputs.len(), 2);
    assert!(graph.inputs[0].pre_args.is_empty());
    assert_eq!(
        graph.chains,
        vec![
            "anullsrc=channel_layout=stereo:sample_rate=44100:d=2[a0]",
            "[0:v:0][1:v:0]concat=n=2:v=1:a=0[v1]",
            "[0:a:0][a0]concat=n=2:v=0:a=1[a2]",
            "[v1]null[vout]",
            "[a2]anull[aout]",
        ]
    );
}

#[test]
fn concat_rejects_mixing_audio_only_and_picture_clips() {
    let err = FfmpegClip::concat(&[video("/v.mp4", 1.0, true), audio("/a.wav", 1.0)]).unwrap_err();
    assert!(matches!(err, VidmasterError::Backend(_)));
    assert!(FfmpegClip::concat(&[]).is_err());
}

#[test]
fn reused_clip_gets_its_own_input_each_time() {
    let talk = video("/in/talk.mp4", 4.0, false);
    let clip = FfmpegClip::concat(&[talk.clone(), talk]).unwrap();
    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(graph.inputs.len(), 2);
    assert_eq!(graph.chains[0], "[0:v:0][1:v:0]concat=n=2:v=1:a=0[v0]");
}

#[test]
fn composite_paints_layers_bottom_up() {
    let bg = image("/in/bg.png", 10.0, 1280, 720);
    let fg = video("/in/talk.mp4", 6.0, true)
        .offset_by(Some(10), Some(20))
        .unwrap();
    assert_eq!(fg.offset(), (10, 20));

    let clip = FfmpegClip::overlay(&[bg, fg], None).unwrap();
    assert_eq!(
        clip.size(),
        Some(Canvas {
            width: 1280,
            height: 720
        })
    );
    assert_eq!(clip.duration(), Some(10.0));

    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(
        graph.chains,
        vec![
            "color=c=black:s=1280x720:d=10[v0]",
            "[v0][0:v:0]overlay=x=0:y=0:eof_action=pass[v1]",
            "[v1][1:v:0]overlay=x=10:y=20:eof_action=pass[v2]",
            "[v2]null[vout]",
            "[1:a:0]anull[aout]",
        ]
    );
}

#[test]
fn composite_mixes_several_audio_layers() {
    let a = video("/in/a.mp4", 3.0, true);
    let b = video("/in/b.mp4", 3.0, true);
    let clip = FfmpegClip::overlay(
        &[a, b],
        Some(Canvas {
            width: 64,
            height: 64,
        }),
    )
    .unwrap();
    let graph = FilterGraph::lower(&clip).unwrap();
    assert!(
        graph
            .chains
            .contains(&"[0:a:0][1:a:0]amix=inputs=2:duration=longest[a3]".to_owned())
    );
}

#[test]
fn composite_without_known_size_fails() {
    let err = FfmpegClip::overlay(&[audio("/a.wav", 1.0)], None).unwrap_err();
    assert!(err.to_string().contains("composition size is unknown"));
}

#[test]
fn setaudio_takes_picture_and_sound_from_different_clips() {
    let picture = video("/in/talk.mp4", 4.0, true);
    let music = audio("/in/music.mp3", 30.0);
    let clip = picture.with_audio(&music).unwrap();
    assert_eq!(clip.duration(), Some(4.0));

    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(graph.inputs.len(), 2);
    assert_eq!(graph.inputs[1].path, PathBuf::from("/in/music.mp3"));
    assert_eq!(
        graph.chains,
        vec![
            "[1:a:0]atrim=end=4[a0]",
            "[0:v:0]null[vout]",
            "[a0]anull[aout]"
        ]
    );
}

#[test]
fn setaudio_needs_a_sound_source() {
    let picture = video("/in/talk.mp4", 4.0, true);
    let silent = video("/in/silent.mp4", 4.0, false);
    assert!(picture.with_audio(&silent).is_err());
    assert!(audio("/a.wav", 1.0).with_audio(&picture).is_err());
}

#[test]
fn trim_cuts_both_streams() {
    let clip = video("/in/talk.mp4", 10.0, true)
        .trim(2.0, Some(5.0))
        .unwrap();
    assert_eq!(clip.duration(), Some(3.0));
    let graph = FilterGraph::lower(&clip).unwrap();
    assert_eq!(
        &graph.chains[..2],
        &[
            "[0:v:0]trim=start=2:end=5,setpts=PTS-STARTPTS[v0]".to_owned(),
            "[0:a:0]atrim=start=2:end=5,asetpts=PTS-STARTPTS[a1]".to_owned(),
        ]
    );

    let open_ended = video("/in/talk.mp4", 10.0, false).trim(4.0, None).unwrap();
    assert_eq!(open_ended.duration(), Some(6.0));
    let graph = FilterGraph::lower(&open_ended).unwrap();
    assert_eq!(graph.chains[0], "[0:v:0]trim=start=4,setpts=PTS-STARTPTS[v0]");
}

#[test]
fn trim_rejects_empty_or_out_of_range() {
    let clip = video("/in/talk.mp4", 10.0, true);
    assert!(clip.trim(5.0, Some(5.0)).is_err());
    assert!(clip.trim(12.0, None).is_err());
}

#[test]
fn effects_need_a_picture() {
    let sound = audio("/in/music.mp3", 3.0);
    assert!(sound.scale(Some(10), None).is_err());
    assert!(sound.pad(1, Rgb8::default(), 1).is_err());
    assert!(sound.offset_by(Some(1), None).is_err());
}
